use std::fmt;

use crate::error::Error;
use crate::word::Word;

/// Unbounded LIFO stack of words
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
  values: Vec<Word>,
}

impl Stack {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, value: Word) {
    self.values.push(value);
  }

  pub fn pop(&mut self) -> Result<Word, Error> {
    self.values.pop().ok_or(Error::StackUnderflow)
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Iterates from the top of the stack down
  pub fn iter(&self) -> impl Iterator<Item = Word> + '_ {
    self.values.iter().rev().copied()
  }
}

/// Top to bottom, one value per line
impl fmt::Display for Stack {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return writeln!(f, "(empty)");
    }
    for (depth, value) in self.iter().enumerate() {
      writeln!(f, "{depth:>5}: {value}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lifo() {
    let mut stack = Stack::new();
    stack.push(Word::wrapping(1));
    stack.push(Word::wrapping(2));
    assert_eq!(stack.len(), 2);
    assert_eq!(stack.pop(), Ok(Word::wrapping(2)));
    assert_eq!(stack.pop(), Ok(Word::wrapping(1)));
    assert!(stack.is_empty());
  }

  #[test]
  fn pop_empty_underflows() {
    let mut stack = Stack::new();
    assert_eq!(stack.pop(), Err(Error::StackUnderflow));
    // still empty, still underflows
    assert_eq!(stack.pop(), Err(Error::StackUnderflow));
  }

  #[test]
  fn dump_is_top_first() {
    let mut stack = Stack::new();
    stack.push(Word::wrapping(10));
    stack.push(Word::wrapping(20));
    let dump = stack.to_string();
    let lines: Vec<_> = dump.lines().collect();
    assert_eq!(lines, ["    0: 20", "    1: 10"]);
    assert_eq!(Stack::new().to_string(), "(empty)\n");
  }
}
