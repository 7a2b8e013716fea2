use std::fmt;
use std::io;

/// An error that occurred during execution of instructions
///
/// Every variant up to `Channel` is fatal: the machine records it as a
/// [`Fault`] and refuses to execute anything further.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("invalid opcode `{0}`")]
  InvalidOpcode(u16),

  #[error("invalid operand `{0}`")]
  InvalidOperand(u16),

  #[error("address `{0}` is outside of memory")]
  InvalidAddress(usize),

  #[error("pop from an empty stack")]
  StackUnderflow,

  #[error("modulo by zero")]
  DivideByZero,

  #[error("no more input is available")]
  InputExhausted,

  #[error("input character {0:?} does not fit in a word")]
  UnrepresentableInput(char),

  #[error("channel i/o failed: {0}")]
  Channel(io::ErrorKind),

  #[error("machine is halted")]
  MachineHalted,

  #[error("machine is faulted")]
  MachineFaulted,
}

impl From<io::Error> for Error {
  fn from(err: io::Error) -> Self {
    Self::Channel(err.kind())
  }
}

/// A fatal error together with the address of the instruction that raised it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
  pub pc: usize,
  pub error: Error,
}

impl fmt::Display for Fault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "fault at pc {}: {}", self.pc, self.error)
  }
}

impl std::error::Error for Fault {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    Some(&self.error)
  }
}
