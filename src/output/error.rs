//! Output layer error types.

use thiserror::Error;

use crate::mpv::MpvError;

/// Errors reported by the output layer and by output modules.
#[derive(Debug, Error)]
pub enum OutputError {
  #[error("No output module available")]
  NoBackendsRegistered,

  #[error("No such output module: '{0}'")]
  BackendNotFound(String),

  #[error("Output module '{name}' failed to initialize: {source}")]
  BackendInitFailed {
    name: &'static str,
    #[source]
    source: Box<OutputError>,
  },

  #[error("An output module is already selected")]
  AlreadySelected,

  #[error("Operation not supported by the output module")]
  Unsupported,

  #[error("No output module selected")]
  NotReady,

  #[error("Option '{0}' is already registered")]
  DuplicateOption(String),

  #[error("MPV error: {0}")]
  Mpv(#[from] MpvError),

  #[error("{0}")]
  Failed(String),
}

impl OutputError {
  /// Per-call outcomes that callers treat as "could not do that right now",
  /// never as a process-level failure.
  pub fn is_benign(&self) -> bool {
    matches!(self, OutputError::Unsupported | OutputError::NotReady)
  }
}

/// Result type alias for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
