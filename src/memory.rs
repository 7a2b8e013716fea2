use crate::error::Error;
use crate::word::Word;

/// Number of addressable cells
pub const MEMORY_SIZE: usize = 32768;

/// Flat word-addressed memory.
///
/// Cells hold raw 16-bit values since a program image carries register
/// operands (`32768..=32775`) alongside literals. Anything the machine itself
/// stores is a [`Word`].
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
  cells: Box<[u16]>,
}

impl Memory {
  /// Zeroed memory, unset cells and zero are indistinguishable
  pub fn new() -> Self {
    Self {
      cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
    }
  }

  pub fn read_word(&self, address: usize) -> Result<u16, Error> {
    self
      .cells
      .get(address)
      .copied()
      .ok_or(Error::InvalidAddress(address))
  }

  pub fn write_word(&mut self, address: usize, value: Word) -> Result<(), Error> {
    self
      .cells
      .get_mut(address)
      .map(|prev| {
        *prev = value.get();
      })
      .ok_or(Error::InvalidAddress(address))
  }

  /// `length` cells starting at `start`, failing on the first address that
  /// falls outside of memory
  pub fn read_slice(&self, start: usize, length: usize) -> Result<&[u16], Error> {
    if length == 0 {
      return Ok(&[]);
    }
    let end = start + length;
    if end > MEMORY_SIZE {
      return Err(Error::InvalidAddress(start.max(MEMORY_SIZE)));
    }
    Ok(&self.cells[start..end])
  }

  /// Copies `words` verbatim to the start of memory and zeroes the rest
  pub fn load_program(&mut self, words: &[u16]) -> Result<(), Error> {
    if words.len() > MEMORY_SIZE {
      return Err(Error::InvalidAddress(MEMORY_SIZE));
    }
    let (image, rest) = self.cells.split_at_mut(words.len());
    image.copy_from_slice(words);
    rest.fill(0);
    Ok(())
  }
}

impl Default for Memory {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Memory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let used = self.cells.iter().filter(|&&cell| cell != 0).count();
    f.debug_struct("Memory")
      .field("size", &self.cells.len())
      .field("non_zero", &used)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_is_zeroed() {
    let memory = Memory::new();
    assert_eq!(memory.read_word(0), Ok(0));
    assert_eq!(memory.read_word(MEMORY_SIZE - 1), Ok(0));
  }

  #[test]
  fn out_of_range_address() {
    let mut memory = Memory::new();
    assert_eq!(memory.read_word(MEMORY_SIZE), Err(Error::InvalidAddress(MEMORY_SIZE)));
    assert_eq!(
      memory.write_word(40000, Word::ONE),
      Err(Error::InvalidAddress(40000))
    );
  }

  #[test]
  fn write_then_read() {
    let mut memory = Memory::new();
    memory.write_word(1234, Word::wrapping(42)).unwrap();
    assert_eq!(memory.read_word(1234), Ok(42));
  }

  #[test]
  fn read_slice() {
    let mut memory = Memory::new();
    memory.load_program(&[9, 32768, 32769, 4]).unwrap();
    assert_eq!(memory.read_slice(1, 3), Ok(&[32768, 32769, 4][..]));
    assert_eq!(memory.read_slice(MEMORY_SIZE, 0), Ok(&[][..]));
    assert_eq!(
      memory.read_slice(MEMORY_SIZE - 1, 2),
      Err(Error::InvalidAddress(MEMORY_SIZE))
    );
  }

  #[test]
  fn load_program_replaces_previous_contents() {
    let mut memory = Memory::new();
    memory.load_program(&[1, 2, 3]).unwrap();
    memory.load_program(&[7]).unwrap();
    assert_eq!(memory.read_slice(0, 3), Ok(&[7, 0, 0][..]));
  }

  #[test]
  fn load_program_too_large() {
    let mut memory = Memory::new();
    let words = vec![0; MEMORY_SIZE + 1];
    assert_eq!(memory.load_program(&words), Err(Error::InvalidAddress(MEMORY_SIZE)));
    assert!(memory.load_program(&words[1..]).is_ok());
  }
}
