use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::error::Error;
use crate::registers::Registers;

/// Number of distinct words, every arithmetic result is reduced modulo this
pub const MODULUS: u32 = 32768;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// First operand encoding that names a register rather than a literal
const REGISTER_BASE: u16 = 32768;

/// Last operand encoding that names a register
const REGISTER_LAST: u16 = REGISTER_BASE + REGISTER_COUNT as u16 - 1;

const MASK: u16 = 0x7FFF;

/// A value in `[0, 32767]`, the base data unit of the machine.
///
/// A `Word` can only be constructed already reduced, so every register, stack
/// slot and memory write performed by the machine holds a valid value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(u16);

impl Word {
  pub const ZERO: Word = Word(0);
  pub const ONE: Word = Word(1);
  pub const MAX: Word = Word(MASK);

  /// Returns `None` if `value` is outside `[0, 32767]`
  pub const fn new(value: u16) -> Option<Self> {
    if value <= MASK {
      Some(Self(value))
    } else {
      None
    }
  }

  /// Reduces `value` modulo 32768
  pub const fn wrapping(value: u32) -> Self {
    Self((value % MODULUS) as u16)
  }

  pub const fn get(self) -> u16 {
    self.0
  }

  pub const fn wrapping_add(self, rhs: Word) -> Word {
    Self::wrapping(self.0 as u32 + rhs.0 as u32)
  }

  pub const fn wrapping_mul(self, rhs: Word) -> Word {
    Self::wrapping(self.0 as u32 * rhs.0 as u32)
  }

  /// `None` when `rhs` is zero
  pub const fn checked_rem(self, rhs: Word) -> Option<Word> {
    if rhs.0 == 0 {
      None
    } else {
      Some(Self(self.0 % rhs.0))
    }
  }

  pub const fn is_zero(self) -> bool {
    self.0 == 0
  }
}

impl BitAnd for Word {
  type Output = Word;

  fn bitand(self, rhs: Word) -> Word {
    Self(self.0 & rhs.0)
  }
}

impl BitOr for Word {
  type Output = Word;

  fn bitor(self, rhs: Word) -> Word {
    Self(self.0 | rhs.0)
  }
}

impl Not for Word {
  type Output = Word;

  // 15-bit complement
  fn not(self) -> Word {
    Self(!self.0 & MASK)
  }
}

impl From<bool> for Word {
  fn from(flag: bool) -> Self {
    if flag {
      Self::ONE
    } else {
      Self::ZERO
    }
  }
}

impl From<Word> for u16 {
  fn from(word: Word) -> Self {
    word.0
  }
}

impl From<Word> for usize {
  fn from(word: Word) -> Self {
    word.0 as usize
  }
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

/// A raw operand exactly as it appears in an instruction slot.
///
/// An operand has to be turned into a [`Word`] through [`Operand::resolve`],
/// or into a register index through [`Operand::register`], before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand(u16);

impl Operand {
  pub const fn new(raw: u16) -> Self {
    Self(raw)
  }

  pub const fn raw(self) -> u16 {
    self.0
  }

  /// The register this operand names, if any
  pub fn register(self) -> Result<usize, Error> {
    match self.0 {
      REGISTER_BASE..=REGISTER_LAST => Ok((self.0 - REGISTER_BASE) as usize),
      raw => Err(Error::InvalidOperand(raw)),
    }
  }

  /// Literal operands denote themselves, register operands denote the current
  /// contents of that register.
  pub fn resolve(self, registers: &Registers) -> Result<Word, Error> {
    match self.0 {
      0..=MASK => Ok(Word(self.0)),
      REGISTER_BASE..=REGISTER_LAST => Ok(registers.get((self.0 - REGISTER_BASE) as usize)),
      raw => Err(Error::InvalidOperand(raw)),
    }
  }
}

impl From<u16> for Operand {
  fn from(raw: u16) -> Self {
    Self(raw)
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      0..=MASK => write!(f, "{}", self.0),
      REGISTER_BASE..=REGISTER_LAST => write!(f, "r{}", self.0 - REGISTER_BASE),
      raw => write!(f, "<invalid {raw}>"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod word {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn new_rejects_out_of_range() {
      assert_eq!(Word::new(32767), Some(Word::MAX));
      assert_eq!(Word::new(32768), None);
      assert_eq!(Word::new(u16::MAX), None);
    }

    #[test]
    fn wrapping_add_overflows() {
      let a = Word::MAX;
      assert_eq!(a.wrapping_add(Word::ONE), Word::ZERO);
      assert_eq!(a.wrapping_add(a).get(), 32766);
    }

    #[test]
    fn checked_rem_by_zero() {
      assert_eq!(Word::ONE.checked_rem(Word::ZERO), None);
    }

    #[test]
    fn not_masks_to_fifteen_bits() {
      assert_eq!(!Word::ZERO, Word::MAX);
      assert_eq!((!Word::wrapping(0b1010)).get(), 0x7FF5);
    }

    proptest! {
      #[test]
      fn add_is_modular(x in 0u16..32768, y in 0u16..32768) {
        let sum = Word::wrapping(x as u32).wrapping_add(Word::wrapping(y as u32));
        prop_assert_eq!(sum.get() as u32, (x as u32 + y as u32) % 32768);
      }

      #[test]
      fn mul_is_modular(x in 0u16..32768, y in 0u16..32768) {
        let product = Word::wrapping(x as u32).wrapping_mul(Word::wrapping(y as u32));
        prop_assert_eq!(product.get() as u32, (x as u32 * y as u32) % 32768);
      }

      #[test]
      fn rem_is_below_divisor(x in 0u16..32768, y in 1u16..32768) {
        let rem = Word::wrapping(x as u32).checked_rem(Word::wrapping(y as u32));
        prop_assert!(matches!(rem, Some(r) if r.get() < y));
      }

      #[test]
      fn double_not_is_identity(x in 0u16..32768) {
        let word = Word::wrapping(x as u32);
        prop_assert_eq!(!!word, word);
      }
    }
  }

  mod operand {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
      let registers = Registers::new();
      assert_eq!(Operand::new(0).resolve(&registers), Ok(Word::ZERO));
      assert_eq!(Operand::new(32767).resolve(&registers), Ok(Word::MAX));
    }

    #[test]
    fn register_resolves_to_contents() {
      let mut registers = Registers::new();
      registers.set(7, Word::wrapping(99));
      assert_eq!(Operand::new(32775).resolve(&registers), Ok(Word::wrapping(99)));
      // resolving never writes
      assert_eq!(registers.get(0), Word::ZERO);
    }

    #[test]
    fn out_of_range_is_invalid() {
      let registers = Registers::new();
      for raw in [32776, 40000, u16::MAX] {
        assert_eq!(Operand::new(raw).resolve(&registers), Err(Error::InvalidOperand(raw)));
      }
    }

    #[test]
    fn register_index() {
      assert_eq!(Operand::new(32768).register(), Ok(0));
      assert_eq!(Operand::new(32775).register(), Ok(7));
      assert_eq!(Operand::new(5).register(), Err(Error::InvalidOperand(5)));
      assert_eq!(Operand::new(32776).register(), Err(Error::InvalidOperand(32776)));
    }

    #[test]
    fn register_range_bounds() {
      let registers = Registers::new();
      assert_eq!(REGISTER_LAST, 32775);
      assert_eq!(Operand::new(REGISTER_LAST).register(), Ok(REGISTER_COUNT - 1));
      assert!(Operand::new(REGISTER_LAST).resolve(&registers).is_ok());
      assert_eq!(
        Operand::new(REGISTER_LAST + 1).resolve(&registers),
        Err(Error::InvalidOperand(REGISTER_LAST + 1))
      );
    }

    #[test]
    fn display() {
      assert_eq!(Operand::new(42).to_string(), "42");
      assert_eq!(Operand::new(32770).to_string(), "r2");
    }
  }
}
