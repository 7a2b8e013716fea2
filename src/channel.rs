use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::Error;
use crate::word::Word;

/// Character input and output used by the `in` and `out` opcodes
pub trait Channel {
  /// Emit the character whose code point is `code`
  fn output(&mut self, code: Word) -> Result<(), Error>;

  /// Block until a character is available; [`Error::InputExhausted`] once the
  /// input has ended
  fn input(&mut self) -> Result<Word, Error>;
}

impl<C> Channel for &mut C
where
  C: Channel + ?Sized,
{
  fn output(&mut self, code: Word) -> Result<(), Error> {
    (**self).output(code)
  }

  fn input(&mut self) -> Result<Word, Error> {
    (**self).input()
  }
}

fn encode(c: char) -> Result<Word, Error> {
  u16::try_from(c as u32)
    .ok()
    .and_then(Word::new)
    .ok_or(Error::UnrepresentableInput(c))
}

/// In-memory channel with a fixed input script and a captured output
#[derive(Debug, Clone, Default)]
pub struct Buffered {
  input: VecDeque<Word>,
  output: Vec<Word>,
}

impl Buffered {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queues every character of `text` as input
  pub fn with_input(text: &str) -> Result<Self, Error> {
    let mut channel = Self::new();
    channel.feed(text)?;
    Ok(channel)
  }

  pub fn feed(&mut self, text: &str) -> Result<(), Error> {
    for c in text.chars() {
      self.input.push_back(encode(c)?);
    }
    Ok(())
  }

  pub fn written(&self) -> &[Word] {
    &self.output
  }

  /// Output rendered as text; every word is a valid `char` since words stop
  /// short of the surrogate range
  pub fn output_string(&self) -> String {
    self
      .output
      .iter()
      .filter_map(|&code| char::from_u32(code.get() as u32))
      .collect()
  }

  pub fn remaining_input(&self) -> usize {
    self.input.len()
  }
}

impl Channel for Buffered {
  fn output(&mut self, code: Word) -> Result<(), Error> {
    self.output.push(code);
    Ok(())
  }

  fn input(&mut self) -> Result<Word, Error> {
    self.input.pop_front().ok_or(Error::InputExhausted)
  }
}

/// Channel over a line-oriented reader and a writer, the process' standard
/// input and output by default.
///
/// Input is read a line at a time and handed out one character per `in`.
pub struct Stdio<R = io::StdinLock<'static>, W = io::StdoutLock<'static>>
where
  R: BufRead,
  W: Write,
{
  reader: R,
  writer: W,
  pending: VecDeque<char>,
}

impl Stdio {
  pub fn new() -> Self {
    Self::from_parts(io::stdin().lock(), io::stdout().lock())
  }
}

impl Default for Stdio {
  fn default() -> Self {
    Self::new()
  }
}

impl<R, W> Stdio<R, W>
where
  R: BufRead,
  W: Write,
{
  pub fn from_parts(reader: R, writer: W) -> Self {
    Self {
      reader,
      writer,
      pending: VecDeque::new(),
    }
  }

  pub fn writer(&self) -> &W {
    &self.writer
  }
}

impl<R, W> Channel for Stdio<R, W>
where
  R: BufRead,
  W: Write,
{
  fn output(&mut self, code: Word) -> Result<(), Error> {
    let c = char::from_u32(code.get() as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut buf = [0; 4];
    self.writer.write_all(c.encode_utf8(&mut buf).as_bytes())?;
    if c == '\n' {
      self.writer.flush()?;
    }
    Ok(())
  }

  fn input(&mut self) -> Result<Word, Error> {
    if self.pending.is_empty() {
      // the prompt may still be sitting in the buffer
      self.writer.flush()?;
      let mut line = String::new();
      if self.reader.read_line(&mut line)? == 0 {
        return Err(Error::InputExhausted);
      }
      self.pending.extend(line.chars());
    }
    let c = self.pending.pop_front().ok_or(Error::InputExhausted)?;
    encode(c)
  }
}

impl<R, W> Drop for Stdio<R, W>
where
  R: BufRead,
  W: Write,
{
  fn drop(&mut self) {
    let _ = self.writer.flush();
  }
}
