use std::time::Instant;

use crate::channel::Channel;
use crate::config::Config;
use crate::error::{Error, Fault};
use crate::memory::Memory;
use crate::opcode::{Instruction, Opcode};
use crate::region::Region;
use crate::registers::Registers;
use crate::stack::Stack;
use crate::word::{Operand, Word};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
  Running,
  Halted,
  Faulted(Fault),
}

/// How a call to [`Vm::run`] ended without faulting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// A `halt` instruction was executed
  Halted,
  /// The step or time budget ran out first; the machine can be resumed
  Aborted { steps: u64 },
}

/// A virtual machine with 15-bit words, eight registers and a stack.
///
/// The machine owns its memory, registers, stack and I/O channel. Every fault
/// is terminal: once [`State::Faulted`] is reached no more instructions run.
#[derive(Debug)]
pub struct Vm<C> {
  // address of the next instruction to execute
  pc: usize,
  memory: Memory,
  registers: Registers,
  stack: Stack,
  channel: C,
  state: State,
  config: Config,
  steps: u64,
}

impl<C> Vm<C>
where
  C: Channel,
{
  /// Create a new, empty virtual machine talking through `channel`
  pub fn new(channel: C) -> Self {
    Self::with_config(channel, Config::default())
  }

  pub fn with_config(channel: C, config: Config) -> Self {
    Self {
      pc: 0,
      memory: Memory::new(),
      registers: Registers::new(),
      stack: Stack::new(),
      channel,
      state: State::Running,
      config,
      steps: 0,
    }
  }

  /// Replace memory with `region` and restart execution from address 0.
  ///
  /// Registers and stack are left alone so a host can preset them.
  pub fn load<R>(&mut self, region: &R) -> Result<(), Error>
  where
    R: Region + ?Sized,
  {
    let words = region.words();
    self.memory.load_program(words)?;
    self.pc = 0;
    self.state = State::Running;
    log::debug!("loaded {} words", words.len());
    Ok(())
  }

  /// Execute a single instruction.
  ///
  /// Any error other than [`Error::MachineHalted`] and
  /// [`Error::MachineFaulted`] is also recorded as the machine's fault.
  pub fn step(&mut self) -> Result<(), Error> {
    match self.state {
      State::Running => {}
      State::Halted => return Err(Error::MachineHalted),
      State::Faulted(_) => return Err(Error::MachineFaulted),
    }
    let mut task = Task::new(self);
    if let Err(error) = task.run() {
      let fault = Fault {
        pc: self.pc,
        error: error.clone(),
      };
      log::debug!("{fault}");
      self.state = State::Faulted(fault);
      return Err(error);
    }
    self.steps += 1;
    if self.config.dump {
      log::debug!(
        target: "wordvm::dump",
        "registers:\n{}stack:\n{}",
        self.registers,
        self.stack
      );
    }
    Ok(())
  }

  /// Execute until the machine halts, faults, or exhausts its budget
  pub fn run(&mut self) -> Result<Outcome, Fault> {
    let started = Instant::now();
    let mut executed = 0;
    loop {
      match &self.state {
        State::Running => {}
        State::Halted => return Ok(Outcome::Halted),
        State::Faulted(fault) => return Err(fault.clone()),
      }
      if self.config.max_steps.is_some_and(|max| executed >= max)
        || self.config.time_limit.is_some_and(|limit| started.elapsed() >= limit)
      {
        log::debug!("aborted after {executed} steps at pc {}", self.pc);
        return Ok(Outcome::Aborted { steps: executed });
      }
      // a failed step is recorded in `self.state` and reported above
      if self.step().is_ok() {
        executed += 1;
      }
    }
  }

  fn fetch(&self) -> Result<Instruction, Error> {
    let opcode = Opcode::try_from(self.memory.read_word(self.pc)?)?;
    let words = self.memory.read_slice(self.pc + 1, opcode.operand_count())?;
    Ok(Instruction::new(opcode, words))
  }
}

impl<C> Vm<C> {
  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn state(&self) -> &State {
    &self.state
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Instructions executed over the machine's lifetime
  pub fn steps(&self) -> u64 {
    self.steps
  }

  pub fn registers(&self) -> &Registers {
    &self.registers
  }

  pub fn registers_mut(&mut self) -> &mut Registers {
    &mut self.registers
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  pub fn channel(&self) -> &C {
    &self.channel
  }

  pub fn channel_mut(&mut self) -> &mut C {
    &mut self.channel
  }

  pub fn into_channel(self) -> C {
    self.channel
  }
}

struct Task<'vm, C> {
  vm: &'vm mut Vm<C>,
  // where execution continues, jumps overwrite it
  next: usize,
}

impl<'vm, C> Task<'vm, C>
where
  C: Channel,
{
  fn new(vm: &'vm mut Vm<C>) -> Self {
    let next = vm.pc;
    Self { vm, next }
  }

  #[inline]
  fn value(&self, operand: Operand) -> Result<Word, Error> {
    operand.resolve(&self.vm.registers)
  }

  #[inline]
  fn store(&mut self, operand: Operand, value: Word) -> Result<(), Error> {
    let r = operand.register()?;
    self.vm.registers.set(r, value);
    Ok(())
  }

  #[inline]
  fn jump(&mut self, target: Word) {
    self.next = target.into();
  }

  fn run(&mut self) -> Result<(), Error> {
    let pc = self.vm.pc;
    let instruction = self.vm.fetch()?;
    if self.vm.config.trace {
      log::debug!(target: "wordvm::trace", "{pc:05}: {instruction}");
    }
    self.next = pc + instruction.size();
    let [a, b, c] = instruction.slots();
    match instruction.opcode {
      Opcode::Halt => halt(self),
      Opcode::Set => set(self, a, b)?,
      Opcode::Push => push(self, a)?,
      Opcode::Pop => pop(self, a)?,
      Opcode::Eq => eq(self, a, b, c)?,
      Opcode::Gt => gt(self, a, b, c)?,
      Opcode::Jmp => jmp(self, a)?,
      Opcode::Jt => jt(self, a, b)?,
      Opcode::Jf => jf(self, a, b)?,
      Opcode::Add => add(self, a, b, c)?,
      Opcode::Mult => mult(self, a, b, c)?,
      Opcode::Mod => modulo(self, a, b, c)?,
      Opcode::And => and(self, a, b, c)?,
      Opcode::Or => or(self, a, b, c)?,
      Opcode::Not => not(self, a, b)?,
      Opcode::Rmem => rmem(self, a, b)?,
      Opcode::Wmem => wmem(self, a, b)?,
      Opcode::Call => call(self, a)?,
      Opcode::Ret => ret(self)?,
      Opcode::Out => out(self, a)?,
      Opcode::In => input(self, a)?,
      Opcode::Noop => {}
    }
    self.vm.pc = self.next;
    Ok(())
  }
}

// (stop execution)
fn halt<C>(task: &mut Task<'_, C>)
where
  C: Channel,
{
  task.vm.state = State::Halted;
  log::debug!("halted at pc {}", task.vm.pc);
}

// r[a] ← b
fn set<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let value = task.value(b)?;
  task.store(a, value)
}

// push(a)
fn push<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let value = task.value(a)?;
  task.vm.stack.push(value);
  Ok(())
}

// r[a] ← pop()
fn pop<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let r = a.register()?;
  let value = task.vm.stack.pop()?;
  task.vm.registers.set(r, value);
  Ok(())
}

// r[a] ← (b == c)
fn eq<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, Word::from(vb == vc))
}

// r[a] ← (b > c)
fn gt<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, Word::from(vb > vc))
}

// pc ← a
fn jmp<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let target = task.value(a)?;
  task.jump(target);
  Ok(())
}

// if a != 0 : pc ← b
fn jt<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (condition, target) = (task.value(a)?, task.value(b)?);
  if !condition.is_zero() {
    task.jump(target);
  }
  Ok(())
}

// if a == 0 : pc ← b
fn jf<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (condition, target) = (task.value(a)?, task.value(b)?);
  if condition.is_zero() {
    task.jump(target);
  }
  Ok(())
}

// r[a] ← (b + c) mod 32768
fn add<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, vb.wrapping_add(vc))
}

// r[a] ← (b × c) mod 32768
fn mult<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, vb.wrapping_mul(vc))
}

// r[a] ← b mod c
fn modulo<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  let rem = vb.checked_rem(vc).ok_or(Error::DivideByZero)?;
  task.store(a, rem)
}

// r[a] ← b & c
fn and<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, vb & vc)
}

// r[a] ← b | c
fn or<C>(task: &mut Task<'_, C>, a: Operand, b: Operand, c: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (vb, vc) = (task.value(b)?, task.value(c)?);
  task.store(a, vb | vc)
}

// r[a] ← ~b & 0x7FFF
fn not<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let vb = task.value(b)?;
  task.store(a, !vb)
}

// r[a] ← m[b]
fn rmem<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let address = task.value(b)?;
  let cell = task.vm.memory.read_word(address.into())?;
  // image cells may hold register encodings, reduce like any other producer
  task.store(a, Word::wrapping(cell as u32))
}

// m[a] ← b
fn wmem<C>(task: &mut Task<'_, C>, a: Operand, b: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let (address, value) = (task.value(a)?, task.value(b)?);
  task.vm.memory.write_word(address.into(), value)
}

// push(pc + 2), pc ← a
fn call<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let target = task.value(a)?;
  let resume = u16::try_from(task.next)
    .ok()
    .and_then(Word::new)
    .ok_or(Error::InvalidAddress(task.next))?;
  task.vm.stack.push(resume);
  task.jump(target);
  Ok(())
}

// pc ← pop()
fn ret<C>(task: &mut Task<'_, C>) -> Result<(), Error>
where
  C: Channel,
{
  let target = task.vm.stack.pop()?;
  task.jump(target);
  Ok(())
}

// write(char(a))
fn out<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let code = task.value(a)?;
  task.vm.channel.output(code)
}

// r[a] ← read()
fn input<C>(task: &mut Task<'_, C>, a: Operand) -> Result<(), Error>
where
  C: Channel,
{
  let r = a.register()?;
  let code = task.vm.channel.input()?;
  task.vm.registers.set(r, code);
  Ok(())
}
