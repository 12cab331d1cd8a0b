//! Command line options contributed by output modules.

use std::collections::HashSet;

use clap::{Arg, Command};

use super::error::{OutputError, Result};

/// Group of options belonging to one module, shown under its own help heading.
#[derive(Debug)]
struct OptionGroup {
  heading: &'static str,
  args: Vec<Arg>,
}

/// Container modules register their flags into before the command line is parsed.
#[derive(Debug, Default)]
pub struct OptionContext {
  known: HashSet<String>,
  groups: Vec<OptionGroup>,
}

impl OptionContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start from the arguments an existing command already defines, so a module
  /// cannot shadow them.
  pub fn for_command(cmd: &Command) -> Self {
    let known = cmd
      .get_arguments()
      .map(|arg| arg.get_id().to_string())
      .collect();
    Self {
      known,
      groups: Vec::new(),
    }
  }

  /// Register `arg` under `heading`. Fails if an option with the same id exists.
  pub fn add(&mut self, heading: &'static str, arg: Arg) -> Result<()> {
    let id = arg.get_id().to_string();
    if !self.known.insert(id.clone()) {
      return Err(OutputError::DuplicateOption(id));
    }

    match self.groups.iter_mut().find(|g| g.heading == heading) {
      Some(group) => group.args.push(arg),
      None => self.groups.push(OptionGroup {
        heading,
        args: vec![arg],
      }),
    }
    Ok(())
  }

  pub fn contains(&self, id: &str) -> bool {
    self.known.contains(id)
  }

  /// Option ids registered by modules, in registration order.
  pub fn ids(&self) -> Vec<String> {
    self
      .groups
      .iter()
      .flat_map(|g| g.args.iter().map(|a| a.get_id().to_string()))
      .collect()
  }

  /// Merge every registered option into `cmd`.
  pub fn apply(self, mut cmd: Command) -> Command {
    for group in self.groups {
      for arg in group.args {
        cmd = cmd.arg(arg.help_heading(group.heading));
      }
    }
    cmd
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_duplicate_option_rejected() {
    let mut ctx = OptionContext::new();
    ctx.add("A", Arg::new("alpha").long("alpha")).unwrap();
    let err = ctx.add("B", Arg::new("alpha").long("alpha")).unwrap_err();
    assert!(matches!(err, OutputError::DuplicateOption(id) if id == "alpha"));
  }

  #[test]
  fn test_existing_command_args_are_reserved() {
    let cmd = Command::new("test").arg(Arg::new("output").long("output"));
    let mut ctx = OptionContext::for_command(&cmd);
    assert!(ctx.contains("output"));
    assert!(ctx.add("Mod", Arg::new("output").long("output")).is_err());
  }

  #[test]
  fn test_apply_merges_into_command() {
    let mut ctx = OptionContext::new();
    ctx.add("Mod", Arg::new("gain").long("gain")).unwrap();
    ctx.add("Mod", Arg::new("device").long("device")).unwrap();
    assert_eq!(ctx.ids(), vec!["gain".to_string(), "device".to_string()]);

    let cmd = ctx.apply(Command::new("test"));
    let matches = cmd
      .try_get_matches_from(["test", "--gain", "3", "--device", "hw:0"])
      .unwrap();
    assert_eq!(matches.get_one::<String>("gain").map(String::as_str), Some("3"));
    assert_eq!(matches.get_one::<String>("device").map(String::as_str), Some("hw:0"));
  }
}
