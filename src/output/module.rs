//! Output module contract.
//!
//! Every backend implements [`OutputModule`]. Each playback operation has a
//! default body that returns [`OutputError::Unsupported`], so a backend only
//! overrides the capabilities it actually has.

use std::fmt;
use std::sync::Arc;

use clap::ArgMatches;
use tokio::runtime::Runtime;

use super::error::{OutputError, Result};
use super::options::OptionContext;
use crate::config::AppConfig;

/// Playback transitions a backend reports back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayFeedback {
  /// Playback ended and nothing was queued.
  Stopped,
  /// The stream set with `set_next_uri` took over from the current one.
  StartedNextStream,
}

/// Stream metadata discovered by a backend while playing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongMetaData {
  pub title: Option<String>,
  pub artist: Option<String>,
  pub album: Option<String>,
  pub genre: Option<String>,
  pub composer: Option<String>,
}

impl SongMetaData {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.artist.is_none()
      && self.album.is_none()
      && self.genre.is_none()
      && self.composer.is_none()
  }
}

/// Track duration and current position, both in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackPosition {
  pub duration_nanos: i64,
  pub position_nanos: i64,
}

/// Invoked by the backend on the loop thread when playback state changes on its own.
pub type TransitionCallback = Arc<dyn Fn(PlayFeedback) + Send + Sync>;

/// Invoked by the backend on the loop thread when stream metadata becomes available.
pub type MetadataCallback = Arc<dyn Fn(&SongMetaData) + Send + Sync>;

/// Everything a module may need while initializing.
pub struct InitContext<'a> {
  /// The process loop. Backends may `block_on` it to finish asynchronous setup
  /// before returning from `init`, and spawn their long-running work on it.
  pub runtime: &'a Runtime,
  /// Parsed command line, including the options every module registered.
  pub matches: &'a ArgMatches,
  pub config: &'a AppConfig,
}

/// A playback backend.
///
/// Calls arrive synchronously and in order from the dispatcher. Implementations
/// must not block; long-running work belongs on the runtime from [`InitContext`].
pub trait OutputModule: Send + Sync {
  /// Short, stable identifier used for selection.
  fn name(&self) -> &'static str;

  /// Human readable summary.
  fn description(&self) -> &'static str;

  /// Register command line options. Runs for every module, active or not.
  fn add_options(&self, _ctx: &mut OptionContext) -> Result<()> {
    Ok(())
  }

  /// Called once, when this module is selected.
  fn init(&self, _ctx: &InitContext<'_>) -> Result<()> {
    Ok(())
  }

  fn set_uri(&self, _uri: &str, _meta_cb: MetadataCallback) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn set_next_uri(&self, _uri: &str) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn play(&self, _transition_cb: TransitionCallback) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn pause(&self) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn stop(&self) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn seek(&self, _position_nanos: i64) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn get_position(&self) -> Result<TrackPosition> {
    Err(OutputError::Unsupported)
  }

  /// Volume as a normalized float; the range is the backend's business.
  fn get_volume(&self) -> Result<f32> {
    Err(OutputError::Unsupported)
  }

  fn set_volume(&self, _volume: f32) -> Result<()> {
    Err(OutputError::Unsupported)
  }

  fn get_mute(&self) -> Result<bool> {
    Err(OutputError::Unsupported)
  }

  fn set_mute(&self, _mute: bool) -> Result<()> {
    Err(OutputError::Unsupported)
  }
}

impl fmt::Debug for dyn OutputModule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OutputModule")
      .field("name", &self.name())
      .field("description", &self.description())
      .finish()
  }
}
