//! Machine configuration.
//!
//! Settings come from, highest priority first:
//! 1. Command line flags (applied by the host on top of [`Config::from_env`])
//! 2. Environment variables `WORDVM_TRACE`, `WORDVM_DUMP`,
//!    `WORDVM_MAX_STEPS` and `WORDVM_TIME_LIMIT_MS`
//! 3. Built-in defaults: no tracing, no dumps, no budget
//!
//! None of these settings change what a program computes.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
  /// Log every decoded instruction before it executes.
  pub trace: bool,

  /// Log registers and stack after every instruction.
  pub dump: bool,

  /// Instructions a single `run` may execute before it aborts.
  pub max_steps: Option<u64>,

  /// Wall-clock time a single `run` may take before it aborts.
  pub time_limit: Option<Duration>,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  /// Defaults with environment overrides applied
  pub fn from_env() -> Self {
    let mut config = Self::default();
    config.apply_env_overrides(|key| std::env::var(key).ok());
    log::debug!("Loaded configuration: {:?}", config);
    config
  }

  pub fn with_trace(mut self, trace: bool) -> Self {
    self.trace = trace;
    self
  }

  pub fn with_dump(mut self, dump: bool) -> Self {
    self.dump = dump;
    self
  }

  pub fn with_max_steps(mut self, max_steps: u64) -> Self {
    self.max_steps = Some(max_steps);
    self
  }

  pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
    self.time_limit = Some(time_limit);
    self
  }

  fn apply_env_overrides<F>(&mut self, var: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(value) = var("WORDVM_TRACE") {
      match parse_flag(&value) {
        Some(flag) => self.trace = flag,
        None => log::warn!("Ignoring WORDVM_TRACE={value}: not a boolean"),
      }
    }
    if let Some(value) = var("WORDVM_DUMP") {
      match parse_flag(&value) {
        Some(flag) => self.dump = flag,
        None => log::warn!("Ignoring WORDVM_DUMP={value}: not a boolean"),
      }
    }
    if let Some(value) = var("WORDVM_MAX_STEPS") {
      match value.trim().parse() {
        Ok(steps) => {
          log::info!("Using WORDVM_MAX_STEPS from environment: {steps}");
          self.max_steps = Some(steps);
        }
        Err(e) => log::warn!("Ignoring WORDVM_MAX_STEPS={value}: {e}"),
      }
    }
    if let Some(value) = var("WORDVM_TIME_LIMIT_MS") {
      match value.trim().parse() {
        Ok(millis) => {
          log::info!("Using WORDVM_TIME_LIMIT_MS from environment: {millis}");
          self.time_limit = Some(Duration::from_millis(millis));
        }
        Err(e) => log::warn!("Ignoring WORDVM_TIME_LIMIT_MS={value}: {e}"),
      }
    }
  }
}

/// Reads a boolean environment value such as `1`, `true`, `off`
pub fn parse_flag(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" | "" => Some(false),
    _ => None,
  }
}
