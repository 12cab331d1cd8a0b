//! No-op output for headless operation and tests.

use parking_lot::Mutex;

use super::error::{OutputError, Result};
use super::module::{MetadataCallback, OutputModule, TrackPosition, TransitionCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DummyState {
  #[default]
  Stopped,
  Playing,
  Paused,
}

#[derive(Debug, Default)]
struct Inner {
  state: DummyState,
  uri: Option<String>,
  next_uri: Option<String>,
  position_nanos: i64,
}

/// Accepts transport commands and remembers them, but renders nothing.
/// Has no volume or mute control.
#[derive(Debug, Default)]
pub struct DummyOutput {
  inner: Mutex<Inner>,
}

impl DummyOutput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> DummyState {
    self.inner.lock().state
  }

  pub fn current_uri(&self) -> Option<String> {
    self.inner.lock().uri.clone()
  }
}

impl OutputModule for DummyOutput {
  fn name(&self) -> &'static str {
    "dummy"
  }

  fn description(&self) -> &'static str {
    "Dummy output module"
  }

  fn set_uri(&self, uri: &str, _meta_cb: MetadataCallback) -> Result<()> {
    log::debug!("dummy: set uri to {}", uri);
    let mut inner = self.inner.lock();
    inner.uri = Some(uri.to_string());
    inner.position_nanos = 0;
    Ok(())
  }

  fn set_next_uri(&self, uri: &str) -> Result<()> {
    log::debug!("dummy: set next uri to {}", uri);
    self.inner.lock().next_uri = Some(uri.to_string());
    Ok(())
  }

  fn play(&self, _transition_cb: TransitionCallback) -> Result<()> {
    let mut inner = self.inner.lock();
    if inner.uri.is_none() {
      inner.uri = inner.next_uri.take();
    }
    let Some(uri) = inner.uri.as_deref() else {
      return Err(OutputError::Failed("Nothing to play".into()));
    };
    log::debug!("dummy: play {}", uri);
    inner.state = DummyState::Playing;
    Ok(())
  }

  fn pause(&self) -> Result<()> {
    let mut inner = self.inner.lock();
    if inner.state == DummyState::Playing {
      inner.state = DummyState::Paused;
    }
    Ok(())
  }

  fn stop(&self) -> Result<()> {
    let mut inner = self.inner.lock();
    inner.state = DummyState::Stopped;
    inner.position_nanos = 0;
    Ok(())
  }

  fn seek(&self, position_nanos: i64) -> Result<()> {
    self.inner.lock().position_nanos = position_nanos;
    Ok(())
  }

  fn get_position(&self) -> Result<TrackPosition> {
    Ok(TrackPosition {
      duration_nanos: 0,
      position_nanos: self.inner.lock().position_nanos,
    })
  }
}
