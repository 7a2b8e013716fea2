use std::fmt;

use crate::word::{Word, REGISTER_COUNT};

/// The eight general purpose registers, all zero at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
  slots: [Word; REGISTER_COUNT],
}

impl Registers {
  pub fn new() -> Self {
    Self::default()
  }

  /// `idx` is taken modulo 8
  pub fn get(&self, idx: usize) -> Word {
    self.slots[idx % REGISTER_COUNT]
  }

  /// `idx` is taken modulo 8
  pub fn set(&mut self, idx: usize, value: Word) {
    self.slots[idx % REGISTER_COUNT] = value;
  }

  pub fn iter(&self) -> impl Iterator<Item = Word> + '_ {
    self.slots.iter().copied()
  }
}

// two rows of four
impl fmt::Display for Registers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, value) in self.slots.iter().enumerate() {
      write!(f, "r{idx} => {value:<5}")?;
      if idx % 4 == 3 {
        writeln!(f)?;
      } else {
        write!(f, "  ")?;
      }
    }
    Ok(())
  }
}
