use std::fs;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;

use crate::memory::MEMORY_SIZE;

/// A region of words that can be loaded at the start of memory
pub trait Region {
  fn words(&self) -> &[u16];
}

impl Region for [u16] {
  fn words(&self) -> &[u16] {
    self
  }
}

impl<const N: usize> Region for [u16; N] {
  fn words(&self) -> &[u16] {
    self
  }
}

/// An error while reading a program image
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
  #[error("binary image has an odd number of bytes ({0})")]
  OddLength(usize),

  #[error("word #{index} is not a 16-bit decimal number")]
  BadWord {
    index: usize,
    #[source]
    source: ParseIntError,
  },

  #[error("image of {0} words does not fit in memory")]
  TooLarge(usize),

  #[error("failed to read image")]
  Io(#[from] std::io::Error),
}

/// A program image: raw 16-bit cells, loaded verbatim from address 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
  words: Vec<u16>,
}

impl Image {
  fn checked(words: Vec<u16>) -> Result<Self, ImageError> {
    if words.len() > MEMORY_SIZE {
      return Err(ImageError::TooLarge(words.len()));
    }
    Ok(Self { words })
  }

  /// Decodes pairs of little-endian bytes
  pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
    if bytes.len() % 2 != 0 {
      return Err(ImageError::OddLength(bytes.len()));
    }
    let words = bytes
      .chunks_exact(2)
      .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
      .collect();
    Self::checked(words)
  }

  /// Reads a binary image
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImageError> {
    let bytes = fs::read(path)?;
    Self::from_le_bytes(&bytes)
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }
}

/// Comma separated decimal words, e.g. `"9, 32768, 32769, 4"`
impl FromStr for Image {
  type Err = ImageError;

  fn from_str(text: &str) -> Result<Self, ImageError> {
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    let words = text
      .split(',')
      .enumerate()
      .map(|(index, word)| {
        word
          .trim()
          .parse::<u16>()
          .map_err(|source| ImageError::BadWord { index, source })
      })
      .collect::<Result<Vec<_>, _>>()?;
    Self::checked(words)
  }
}

impl TryFrom<Vec<u16>> for Image {
  type Error = ImageError;

  fn try_from(words: Vec<u16>) -> Result<Self, ImageError> {
    Self::checked(words)
  }
}

impl Region for Image {
  fn words(&self) -> &[u16] {
    &self.words
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_text() {
    let image: Image = "9, 32768, 32769, 4, 19, 32768".parse().unwrap();
    assert_eq!(image.words(), &[9, 32768, 32769, 4, 19, 32768]);
    assert_eq!(image.len(), 6);
  }

  #[test]
  fn parse_text_tolerates_whitespace() {
    let image: Image = " 1,32768 ,\n3 ".parse().unwrap();
    assert_eq!(image.words(), &[1, 32768, 3]);
    assert!("".parse::<Image>().unwrap().is_empty());
    assert!("  \n".parse::<Image>().unwrap().is_empty());
  }

  #[test]
  fn parse_text_rejects_bad_words() {
    let err = "1, x, 3".parse::<Image>().unwrap_err();
    assert!(matches!(err, ImageError::BadWord { index: 1, .. }));
    let err = "1, 65536".parse::<Image>().unwrap_err();
    assert!(matches!(err, ImageError::BadWord { index: 1, .. }));
    let err = "1,,2".parse::<Image>().unwrap_err();
    assert!(matches!(err, ImageError::BadWord { index: 1, .. }));
  }

  #[test]
  fn binary_is_little_endian() {
    let image = Image::from_le_bytes(&[0x09, 0x00, 0x00, 0x80, 0x01, 0x80]).unwrap();
    assert_eq!(image.words(), &[9, 32768, 32769]);
  }

  #[test]
  fn binary_odd_length() {
    assert!(matches!(
      Image::from_le_bytes(&[1, 2, 3]),
      Err(ImageError::OddLength(3))
    ));
  }

  #[test]
  fn too_large() {
    let words = vec![0; MEMORY_SIZE + 1];
    assert!(matches!(
      Image::try_from(words),
      Err(ImageError::TooLarge(32769))
    ));
  }

  #[test]
  fn missing_file() {
    let err = Image::from_file("/definitely/not/here.bin").unwrap_err();
    assert!(matches!(err, ImageError::Io(_)));
  }
}
