//! Command dispatcher: the single entry point the control layer talks to.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::error::{OutputError, Result};
use super::module::{
  InitContext, MetadataCallback, OutputModule, TrackPosition, TransitionCallback,
};
use super::options::OptionContext;
use super::registry::OutputRegistry;

/// Owns the module registry and the active module slot.
///
/// The active module is written once by [`Output::select`] and then only read.
/// Every playback call is forwarded to it unchanged; before selection they all
/// return [`OutputError::NotReady`].
pub struct Output {
  registry: OutputRegistry,
  active: OnceLock<Arc<dyn OutputModule>>,
  select_lock: Mutex<()>,
}

impl Output {
  pub fn new(registry: OutputRegistry) -> Self {
    Self {
      registry,
      active: OnceLock::new(),
      select_lock: Mutex::new(()),
    }
  }

  pub fn registry(&self) -> &OutputRegistry {
    &self.registry
  }

  /// Options of every registered module, not only the active one: they are
  /// needed before the command line that picks the module is parsed.
  pub fn add_options(&self, ctx: &mut OptionContext) -> Result<()> {
    self.registry.add_options(ctx)
  }

  /// Pick the active module by name, or the default when `requested` is `None`,
  /// and initialize it. Nothing becomes active if any step fails.
  pub fn select(
    &self,
    requested: Option<&str>,
    ctx: &InitContext<'_>,
  ) -> Result<Arc<dyn OutputModule>> {
    let _guard = self.select_lock.lock();
    if self.active.get().is_some() {
      return Err(OutputError::AlreadySelected);
    }

    let module = match requested {
      None => self
        .registry
        .default_module()
        .ok_or(OutputError::NoBackendsRegistered)?,
      Some(name) => {
        if self.registry.is_empty() {
          return Err(OutputError::NoBackendsRegistered);
        }
        self
          .registry
          .find(name)
          .ok_or_else(|| OutputError::BackendNotFound(name.to_string()))?
      }
    }
    .clone();

    log::info!(
      "Using output module: {} ({})",
      module.name(),
      module.description()
    );

    module.init(ctx).map_err(|e| OutputError::BackendInitFailed {
      name: module.name(),
      source: Box::new(e),
    })?;

    // Guarded by select_lock, so the slot is still empty here.
    let _ = self.active.set(module.clone());
    Ok(module)
  }

  /// The active module, if selection has happened.
  pub fn active(&self) -> Option<&Arc<dyn OutputModule>> {
    self.active.get()
  }

  fn module(&self) -> Result<&Arc<dyn OutputModule>> {
    self.active.get().ok_or(OutputError::NotReady)
  }

  pub fn set_uri(&self, uri: &str, meta_cb: MetadataCallback) -> Result<()> {
    self.module()?.set_uri(uri, meta_cb)
  }

  pub fn set_next_uri(&self, uri: &str) -> Result<()> {
    self.module()?.set_next_uri(uri)
  }

  pub fn play(&self, transition_cb: TransitionCallback) -> Result<()> {
    self.module()?.play(transition_cb)
  }

  pub fn pause(&self) -> Result<()> {
    self.module()?.pause()
  }

  pub fn stop(&self) -> Result<()> {
    self.module()?.stop()
  }

  pub fn seek(&self, position_nanos: i64) -> Result<()> {
    self.module()?.seek(position_nanos)
  }

  pub fn get_position(&self) -> Result<TrackPosition> {
    self.module()?.get_position()
  }

  pub fn get_volume(&self) -> Result<f32> {
    self.module()?.get_volume()
  }

  pub fn set_volume(&self, volume: f32) -> Result<()> {
    self.module()?.set_volume(volume)
  }

  pub fn get_mute(&self) -> Result<bool> {
    self.module()?.get_mute()
  }

  pub fn set_mute(&self, mute: bool) -> Result<()> {
    self.module()?.set_mute(mute)
  }
}
