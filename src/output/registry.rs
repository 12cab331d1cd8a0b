//! Ordered table of known output modules.

use std::io::{self, Write};
use std::sync::Arc;

use super::error::Result;
use super::module::OutputModule;
use super::options::OptionContext;

/// Fixed, ordered list of output modules. The first entry is the default.
#[derive(Clone, Default)]
pub struct OutputRegistry {
  modules: Vec<Arc<dyn OutputModule>>,
}

impl OutputRegistry {
  pub fn new(modules: Vec<Arc<dyn OutputModule>>) -> Self {
    Self { modules }
  }

  /// Modules compiled into this build, default first.
  pub fn builtin() -> Self {
    Self::new(vec![
      Arc::new(crate::output::dummy::DummyOutput::new()),
      Arc::new(crate::mpv::MpvOutput::new()),
    ])
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn list(&self) -> &[Arc<dyn OutputModule>] {
    &self.modules
  }

  pub fn default_module(&self) -> Option<&Arc<dyn OutputModule>> {
    self.modules.first()
  }

  /// First module whose name matches, scanning front to back.
  pub fn find(&self, name: &str) -> Option<&Arc<dyn OutputModule>> {
    self.modules.iter().find(|m| m.name() == name)
  }

  /// Let every module register its options, in order. Stops at the first failure.
  pub fn add_options(&self, ctx: &mut OptionContext) -> Result<()> {
    for module in &self.modules {
      module.add_options(ctx)?;
    }
    Ok(())
  }

  /// Write the human readable module listing.
  pub fn dump_modules<W: Write>(&self, out: &mut W) -> io::Result<()> {
    writeln!(out, "Supported output modules:")?;
    if self.modules.is_empty() {
      writeln!(out, "  NONE!")?;
      return Ok(());
    }
    for (i, module) in self.modules.iter().enumerate() {
      writeln!(
        out,
        "  {}\t{}{}",
        module.name(),
        module.description(),
        if i == 0 { " (default)" } else { "" }
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::error::OutputError;
  use crate::output::testing::RecordingOutput;
  use clap::Arg;

  #[test]
  fn test_dump_marks_first_as_default() {
    let registry = OutputRegistry::new(vec![
      Arc::new(RecordingOutput::new("first", "First module")),
      Arc::new(RecordingOutput::new("second", "Second module")),
    ]);
    let mut out = Vec::new();
    registry.dump_modules(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
      text,
      "Supported output modules:\n  first\tFirst module (default)\n  second\tSecond module\n"
    );
  }

  #[test]
  fn test_dump_empty_registry() {
    let mut out = Vec::new();
    OutputRegistry::default().dump_modules(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Supported output modules:\n  NONE!\n");
  }

  #[test]
  fn test_find_returns_earliest_duplicate() {
    let registry = OutputRegistry::new(vec![
      Arc::new(RecordingOutput::new("dup", "earliest")),
      Arc::new(RecordingOutput::new("dup", "later")),
    ]);
    assert_eq!(registry.find("dup").unwrap().description(), "earliest");
    assert!(registry.find("missing").is_none());
  }

  #[test]
  fn test_add_options_runs_in_order_and_stops_at_failure() {
    let a = Arc::new(RecordingOutput::new("a", "A").with_option("alpha"));
    let b = Arc::new(RecordingOutput::new("b", "B").with_failing_options());
    let c = Arc::new(RecordingOutput::new("c", "C").with_option("gamma"));
    let registry = OutputRegistry::new(vec![a.clone(), b.clone(), c.clone()]);

    let mut ctx = OptionContext::new();
    let err = registry.add_options(&mut ctx).unwrap_err();
    assert!(matches!(err, OutputError::Failed(_)));
    assert!(ctx.contains("alpha"));
    assert!(!ctx.contains("gamma"));
    assert_eq!(a.calls(), vec!["add_options"]);
    assert_eq!(b.calls(), vec!["add_options"]);
    assert!(c.calls().is_empty());
  }

  #[test]
  fn test_add_options_covers_every_module() {
    let registry = OutputRegistry::new(vec![
      Arc::new(RecordingOutput::new("a", "A").with_option("alpha")),
      Arc::new(RecordingOutput::new("b", "B").with_option("beta")),
    ]);
    let mut ctx = OptionContext::new();
    registry.add_options(&mut ctx).unwrap();
    assert_eq!(ctx.ids(), vec!["alpha".to_string(), "beta".to_string()]);
  }

  #[test]
  fn test_builtin_modules_register_distinct_options() {
    let registry = OutputRegistry::builtin();
    assert_eq!(registry.default_module().unwrap().name(), "dummy");
    assert!(registry.find("mpv").is_some());

    let mut ctx = OptionContext::new();
    registry.add_options(&mut ctx).unwrap();
    let cmd = ctx.apply(clap::Command::new("test").arg(Arg::new("output").long("output")));
    assert!(cmd.try_get_matches_from(["test"]).is_ok());
  }
}
