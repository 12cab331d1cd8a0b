//! Test doubles for the output layer.

use parking_lot::Mutex;

use clap::Arg;

use super::error::{OutputError, Result};
use super::module::{
  InitContext, MetadataCallback, OutputModule, TrackPosition, TransitionCallback,
};
use super::options::OptionContext;

/// Module that only has a name; every capability falls back to the trait defaults.
pub struct BareOutput {
  pub name: &'static str,
}

impl OutputModule for BareOutput {
  fn name(&self) -> &'static str {
    self.name
  }

  fn description(&self) -> &'static str {
    "bare"
  }
}

/// Module that records every call it receives.
pub struct RecordingOutput {
  name: &'static str,
  description: &'static str,
  option: Option<&'static str>,
  fail_options: bool,
  fail_init: bool,
  volume_control: bool,
  calls: Mutex<Vec<&'static str>>,
  pub last_uri: Mutex<Option<String>>,
  pub last_seek: Mutex<Option<i64>>,
  pub last_volume: Mutex<Option<f32>>,
  pub last_mute: Mutex<Option<bool>>,
  pub transition_cb: Mutex<Option<TransitionCallback>>,
  pub meta_cb: Mutex<Option<MetadataCallback>>,
}

impl RecordingOutput {
  pub fn new(name: &'static str, description: &'static str) -> Self {
    Self {
      name,
      description,
      option: None,
      fail_options: false,
      fail_init: false,
      volume_control: false,
      calls: Mutex::new(Vec::new()),
      last_uri: Mutex::new(None),
      last_seek: Mutex::new(None),
      last_volume: Mutex::new(None),
      last_mute: Mutex::new(None),
      transition_cb: Mutex::new(None),
      meta_cb: Mutex::new(None),
    }
  }

  pub fn with_option(mut self, id: &'static str) -> Self {
    self.option = Some(id);
    self
  }

  pub fn with_failing_options(mut self) -> Self {
    self.fail_options = true;
    self
  }

  pub fn with_failing_init(mut self) -> Self {
    self.fail_init = true;
    self
  }

  pub fn with_volume_control(mut self) -> Self {
    self.volume_control = true;
    self
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.calls.lock().clone()
  }

  fn record(&self, call: &'static str) {
    self.calls.lock().push(call);
  }
}

impl OutputModule for RecordingOutput {
  fn name(&self) -> &'static str {
    self.name
  }

  fn description(&self) -> &'static str {
    self.description
  }

  fn add_options(&self, ctx: &mut OptionContext) -> Result<()> {
    self.record("add_options");
    if self.fail_options {
      return Err(OutputError::Failed(format!("{} rejected its options", self.name)));
    }
    if let Some(id) = self.option {
      ctx.add(self.description, Arg::new(id).long(id))?;
    }
    Ok(())
  }

  fn init(&self, _ctx: &InitContext<'_>) -> Result<()> {
    self.record("init");
    if self.fail_init {
      return Err(OutputError::Failed("init refused".into()));
    }
    Ok(())
  }

  fn set_uri(&self, uri: &str, meta_cb: MetadataCallback) -> Result<()> {
    self.record("set_uri");
    *self.last_uri.lock() = Some(uri.to_string());
    *self.meta_cb.lock() = Some(meta_cb);
    Ok(())
  }

  fn set_next_uri(&self, uri: &str) -> Result<()> {
    self.record("set_next_uri");
    *self.last_uri.lock() = Some(uri.to_string());
    Ok(())
  }

  fn play(&self, transition_cb: TransitionCallback) -> Result<()> {
    self.record("play");
    *self.transition_cb.lock() = Some(transition_cb);
    Ok(())
  }

  fn pause(&self) -> Result<()> {
    self.record("pause");
    Ok(())
  }

  fn stop(&self) -> Result<()> {
    self.record("stop");
    Err(OutputError::Failed("pipeline refused to stop".into()))
  }

  fn seek(&self, position_nanos: i64) -> Result<()> {
    self.record("seek");
    *self.last_seek.lock() = Some(position_nanos);
    Ok(())
  }

  fn get_position(&self) -> Result<TrackPosition> {
    self.record("get_position");
    Ok(TrackPosition {
      duration_nanos: 240_000_000_000,
      position_nanos: 12_500_000_000,
    })
  }

  fn get_volume(&self) -> Result<f32> {
    if !self.volume_control {
      return Err(OutputError::Unsupported);
    }
    self.record("get_volume");
    Ok(self.last_volume.lock().unwrap_or(1.0))
  }

  fn set_volume(&self, volume: f32) -> Result<()> {
    if !self.volume_control {
      return Err(OutputError::Unsupported);
    }
    self.record("set_volume");
    *self.last_volume.lock() = Some(volume);
    Ok(())
  }

  fn get_mute(&self) -> Result<bool> {
    if !self.volume_control {
      return Err(OutputError::Unsupported);
    }
    self.record("get_mute");
    Ok(self.last_mute.lock().unwrap_or(false))
  }

  fn set_mute(&self, mute: bool) -> Result<()> {
    if !self.volume_control {
      return Err(OutputError::Unsupported);
    }
    self.record("set_mute");
    *self.last_mute.lock() = Some(mute);
    Ok(())
  }
}

/// Run `f` with an init context backed by a throwaway runtime and empty matches.
pub fn with_init_ctx<R>(f: impl FnOnce(&InitContext<'_>) -> R) -> R {
  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .expect("test runtime");
  let matches = clap::ArgMatches::default();
  let config = crate::config::AppConfig::default();
  let ctx = InitContext {
    runtime: &runtime,
    matches: &matches,
    config: &config,
  };
  f(&ctx)
}
