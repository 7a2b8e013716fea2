//! Interpreter for a small 15-bit word virtual machine.
//!
//! The machine has 32768 words of memory, eight registers, an unbounded stack
//! and 22 opcodes. Numbers in `[0, 32767]` are literals, `[32768, 32775]` name
//! registers `r0..r7`, everything above is invalid.

pub mod channel;
pub mod config;
pub mod error;
pub mod memory;
pub mod opcode;
pub mod region;
pub mod registers;
pub mod stack;
pub mod vm;
pub mod word;

pub use channel::{Buffered, Channel, Stdio};
pub use config::Config;
pub use error::{Error, Fault};
pub use region::{Image, ImageError, Region};
pub use vm::{Outcome, State, Vm};
pub use word::{Operand, Word};
