use std::fmt;

use crate::error::Error;
use crate::word::Operand;

/// Largest operand count of any opcode
pub const MAX_OPERANDS: usize = 3;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// | Operation | Semantics/RTL      | Assembly |
  /// |-----------|--------------------|----------|
  /// | Halt      | `(stop execution)` | `halt`   |
  Halt = 0,

  /// | Operation | Semantics/RTL | Assembly  |
  /// |-----------|---------------|-----------|
  /// | Set       | `r[a] ← b`    | `set a b` |
  Set = 1,

  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Push      | `push(a)`     | `push a` |
  Push = 2,

  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Pop       | `r[a] ← pop()`| `pop a`  |
  Pop = 3,

  /// | Operation | Semantics/RTL       | Assembly   |
  /// |-----------|---------------------|------------|
  /// | Equal     | `r[a] ← (b == c)`   | `eq a b c` |
  Eq = 4,

  /// | Operation    | Semantics/RTL     | Assembly   |
  /// |--------------|-------------------|------------|
  /// | Greater Than | `r[a] ← (b > c)`  | `gt a b c` |
  Gt = 5,

  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Jump      | `pc ← a`      | `jmp a`  |
  Jmp = 6,

  /// | Operation    | Semantics/RTL          | Assembly |
  /// |--------------|------------------------|----------|
  /// | Jump If True | `if a != 0 : pc ← b`   | `jt a b` |
  Jt = 7,

  /// | Operation     | Semantics/RTL          | Assembly |
  /// |---------------|------------------------|----------|
  /// | Jump If False | `if a == 0 : pc ← b`   | `jf a b` |
  Jf = 8,

  /// | Operation | Semantics/RTL                 | Assembly    |
  /// |-----------|-------------------------------|-------------|
  /// | Add       | `r[a] ← (b + c) mod 32768`    | `add a b c` |
  Add = 9,

  /// | Operation | Semantics/RTL                 | Assembly     |
  /// |-----------|-------------------------------|--------------|
  /// | Multiply  | `r[a] ← (b × c) mod 32768`    | `mult a b c` |
  Mult = 10,

  /// Faults with [`Error::DivideByZero`] if `c` is zero.
  ///
  /// | Operation | Semantics/RTL       | Assembly    |
  /// |-----------|---------------------|-------------|
  /// | Modulo    | `r[a] ← b mod c`    | `mod a b c` |
  Mod = 11,

  /// | Operation   | Semantics/RTL    | Assembly    |
  /// |-------------|------------------|-------------|
  /// | Logical AND | `r[a] ← b & c`   | `and a b c` |
  And = 12,

  /// | Operation  | Semantics/RTL    | Assembly   |
  /// |------------|------------------|------------|
  /// | Logical OR | `r[a] ← b \| c`  | `or a b c` |
  Or = 13,

  /// | Operation   | Semantics/RTL          | Assembly  |
  /// |-------------|------------------------|-----------|
  /// | Logical NOT | `r[a] ← ~b & 0x7FFF`   | `not a b` |
  Not = 14,

  /// | Operation   | Semantics/RTL  | Assembly   |
  /// |-------------|----------------|------------|
  /// | Read Memory | `r[a] ← m[b]`  | `rmem a b` |
  Rmem = 15,

  /// | Operation    | Semantics/RTL | Assembly   |
  /// |--------------|---------------|------------|
  /// | Write Memory | `m[a] ← b`    | `wmem a b` |
  Wmem = 16,

  /// | Operation | Semantics/RTL                 | Assembly |
  /// |-----------|-------------------------------|----------|
  /// | Call      | `push(pc + 2)` then `pc ← a`  | `call a` |
  Call = 17,

  /// Faults with [`Error::StackUnderflow`] on an empty stack.
  ///
  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Return    | `pc ← pop()`  | `ret`    |
  Ret = 18,

  /// | Operation | Semantics/RTL       | Assembly |
  /// |-----------|---------------------|----------|
  /// | Output    | `write(char(a))`    | `out a`  |
  Out = 19,

  /// Blocks until a character is available, faults with
  /// [`Error::InputExhausted`] once input has ended.
  ///
  /// | Operation | Semantics/RTL   | Assembly |
  /// |-----------|-----------------|----------|
  /// | Input     | `r[a] ← read()` | `in a`   |
  In = 20,

  /// | Operation | Semantics/RTL  | Assembly |
  /// |-----------|----------------|----------|
  /// | Nop       | `(do nothing)` | `noop`   |
  Noop = 21,
}

impl Opcode {
  /// Every opcode, indexed by its number
  pub const ALL: [Opcode; 22] = [
    Self::Halt,
    Self::Set,
    Self::Push,
    Self::Pop,
    Self::Eq,
    Self::Gt,
    Self::Jmp,
    Self::Jt,
    Self::Jf,
    Self::Add,
    Self::Mult,
    Self::Mod,
    Self::And,
    Self::Or,
    Self::Not,
    Self::Rmem,
    Self::Wmem,
    Self::Call,
    Self::Ret,
    Self::Out,
    Self::In,
    Self::Noop,
  ];

  pub const fn mnemonic(self) -> &'static str {
    match self {
      Self::Halt => "halt",
      Self::Set => "set",
      Self::Push => "push",
      Self::Pop => "pop",
      Self::Eq => "eq",
      Self::Gt => "gt",
      Self::Jmp => "jmp",
      Self::Jt => "jt",
      Self::Jf => "jf",
      Self::Add => "add",
      Self::Mult => "mult",
      Self::Mod => "mod",
      Self::And => "and",
      Self::Or => "or",
      Self::Not => "not",
      Self::Rmem => "rmem",
      Self::Wmem => "wmem",
      Self::Call => "call",
      Self::Ret => "ret",
      Self::Out => "out",
      Self::In => "in",
      Self::Noop => "noop",
    }
  }

  pub const fn operand_count(self) -> usize {
    match self {
      Self::Halt | Self::Ret | Self::Noop => 0,
      Self::Push | Self::Pop | Self::Jmp | Self::Call | Self::Out | Self::In => 1,
      Self::Set | Self::Jt | Self::Jf | Self::Not | Self::Rmem | Self::Wmem => 2,
      Self::Eq | Self::Gt | Self::Add | Self::Mult | Self::Mod | Self::And | Self::Or => 3,
    }
  }
}

impl TryFrom<u16> for Opcode {
  type Error = Error;

  fn try_from(raw: u16) -> Result<Self, Error> {
    Self::ALL
      .get(raw as usize)
      .copied()
      .ok_or(Error::InvalidOpcode(raw))
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// An opcode together with its raw, still unresolved operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
  pub opcode: Opcode,
  operands: [Operand; MAX_OPERANDS],
}

impl Instruction {
  /// Builds an instruction from the words following the opcode; `words` must
  /// hold exactly `opcode.operand_count()` entries.
  pub fn new(opcode: Opcode, words: &[u16]) -> Self {
    let mut operands = [Operand::new(0); MAX_OPERANDS];
    for (slot, &raw) in operands.iter_mut().zip(words) {
      *slot = Operand::new(raw);
    }
    Self { opcode, operands }
  }

  pub fn operands(&self) -> &[Operand] {
    &self.operands[..self.opcode.operand_count()]
  }

  /// All operand slots, unused ones are zero
  pub(crate) fn slots(&self) -> [Operand; MAX_OPERANDS] {
    self.operands
  }

  /// Number of words the instruction occupies in memory
  pub fn size(&self) -> usize {
    1 + self.opcode.operand_count()
  }
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.opcode)?;
    for operand in self.operands() {
      write!(f, " {operand}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn table_is_indexed_by_number() {
    for (number, opcode) in Opcode::ALL.iter().enumerate() {
      assert_eq!(*opcode as usize, number);
      assert_eq!(Opcode::try_from(number as u16), Ok(*opcode));
    }
  }

  #[test]
  fn mnemonics_are_unique() {
    let mut seen: Vec<&str> = Opcode::ALL.iter().map(|op| op.mnemonic()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), Opcode::ALL.len());
  }

  #[test]
  fn operand_counts() {
    let expected = [0, 2, 1, 1, 3, 3, 1, 2, 2, 3, 3, 3, 3, 3, 2, 2, 2, 1, 0, 1, 1, 0];
    let counts: Vec<usize> = Opcode::ALL.iter().map(|op| op.operand_count()).collect();
    assert_eq!(counts, expected);
  }

  #[test]
  fn jt_and_noop_are_reachable() {
    assert_eq!(Opcode::try_from(7), Ok(Opcode::Jt));
    assert_eq!(Opcode::Jt.operand_count(), 2);
    assert_eq!(Opcode::try_from(21), Ok(Opcode::Noop));
    assert_eq!(Opcode::try_from(11), Ok(Opcode::Mod));
  }

  #[test]
  fn unknown_opcodes() {
    for raw in [22, 100, 32768, u16::MAX] {
      assert_eq!(Opcode::try_from(raw), Err(Error::InvalidOpcode(raw)));
    }
  }

  #[test]
  fn instruction_display() {
    let add = Instruction::new(Opcode::Add, &[32768, 32769, 4]);
    assert_eq!(add.to_string(), "add r0 r1 4");
    assert_eq!(add.size(), 4);
    assert_eq!(Instruction::new(Opcode::Ret, &[]).to_string(), "ret");
  }
}
