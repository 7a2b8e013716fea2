use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use wordvm::config::parse_flag;
use wordvm::word::Word;
use wordvm::{Config, Image, Outcome, Stdio, Vm};

const USAGE: &str = "usage: main [--trace] [--dump] [--max-steps N] [--time-limit-ms N] \
                     [--set-register IDX=VALUE]... (--inline WORDS | FILE)";

struct Args {
  config: Config,
  presets: Vec<(usize, Word)>,
  image: Image,
}

enum Command {
  Run(Args),
  Help,
}

/// Whether trace or dump output was asked for, before the config is loaded
fn verbose<F>(args: &[String], var: F) -> bool
where
  F: Fn(&str) -> Option<String>,
{
  args.iter().any(|arg| arg == "--trace" || arg == "--dump")
    || ["WORDVM_TRACE", "WORDVM_DUMP"]
      .iter()
      .any(|key| var(key).and_then(|value| parse_flag(&value)) == Some(true))
}

fn parse_preset(text: &str) -> anyhow::Result<(usize, Word)> {
  let (idx, value) = text
    .split_once('=')
    .ok_or_else(|| anyhow!("expected IDX=VALUE, got `{text}`"))?;
  let idx: usize = idx.trim().parse().context("register index")?;
  if idx >= 8 {
    bail!("register index {idx} is out of range");
  }
  let value: u16 = value.trim().parse().context("register value")?;
  let value = Word::new(value).ok_or_else(|| anyhow!("{value} does not fit in a word"))?;
  Ok((idx, value))
}

fn parse_args(mut config: Config, args: Vec<String>) -> anyhow::Result<Command> {
  let mut presets = Vec::new();
  let mut image = None;

  let mut args = args.into_iter();
  while let Some(arg) = args.next() {
    let mut value = |flag: &str| args.next().ok_or_else(|| anyhow!("{flag} needs a value"));
    match arg.as_str() {
      "--trace" => config.trace = true,
      "--dump" => config.dump = true,
      "--max-steps" => {
        let steps = value(&arg)?.parse().context("--max-steps")?;
        config.max_steps = Some(steps);
      }
      "--time-limit-ms" => {
        let millis = value(&arg)?.parse().context("--time-limit-ms")?;
        config.time_limit = Some(Duration::from_millis(millis));
      }
      "--set-register" => presets.push(parse_preset(&value(&arg)?)?),
      "--inline" => image = Some(value(&arg)?.parse::<Image>()?),
      "-h" | "--help" => return Ok(Command::Help),
      path if !path.starts_with('-') => {
        let loaded = Image::from_file(path).with_context(|| format!("loading {path}"))?;
        image = Some(loaded);
      }
      other => bail!("unknown flag `{other}`\n{USAGE}"),
    }
  }

  let image = image.ok_or_else(|| anyhow!(USAGE))?;
  Ok(Command::Run(Args {
    config,
    presets,
    image,
  }))
}

fn main() -> anyhow::Result<ExitCode> {
  let argv: Vec<String> = env::args().skip(1).collect();

  // the logger has to exist before the config so its warnings are shown
  let default_filter = if verbose(&argv, |key| env::var(key).ok()) {
    "debug"
  } else {
    "warn"
  };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
    .init();

  let args = match parse_args(Config::from_env(), argv)? {
    Command::Run(args) => args,
    Command::Help => {
      println!("{USAGE}");
      return Ok(ExitCode::SUCCESS);
    }
  };

  let mut vm = Vm::with_config(Stdio::new(), args.config);
  vm.load(&args.image)?;
  for (idx, value) in args.presets {
    vm.registers_mut().set(idx, value);
  }

  match vm.run() {
    Ok(Outcome::Halted) => {
      log::info!("halted after {} steps", vm.steps());
      Ok(ExitCode::SUCCESS)
    }
    Ok(Outcome::Aborted { steps }) => {
      eprintln!("aborted after {steps} steps at pc {}", vm.pc());
      Ok(ExitCode::from(2))
    }
    Err(fault) => {
      eprintln!("{fault}");
      eprint!("{}", vm.registers());
      Ok(ExitCode::from(1))
    }
  }
}
