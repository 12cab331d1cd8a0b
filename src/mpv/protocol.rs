//! MPV JSON IPC protocol types.
//!
//! Reference: https://mpv.io/manual/master/#json-ipc

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::output::SongMetaData;

/// Global request ID counter for unique command identification.
static REQUEST_ID: AtomicI64 = AtomicI64::new(1);

pub fn next_request_id() -> i64 {
  REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// Command sent to MPV via IPC.
#[derive(Debug, Clone, Serialize)]
pub struct MpvCommand {
  pub command: Vec<Value>,
  pub request_id: i64,
}

impl MpvCommand {
  pub fn new(args: Vec<Value>) -> Self {
    Self {
      command: args,
      request_id: next_request_id(),
    }
  }

  /// Replace whatever is playing with `url`.
  pub fn loadfile(url: &str) -> Self {
    Self::new(vec!["loadfile".into(), url.into(), "replace".into()])
  }

  /// Seek to absolute position in seconds.
  pub fn seek(seconds: f64) -> Self {
    Self::new(vec!["seek".into(), seconds.into(), "absolute".into()])
  }

  /// Stop playback and unload the file; MPV stays idle.
  pub fn stop() -> Self {
    Self::new(vec!["stop".into()])
  }

  pub fn set_property(name: &str, value: impl Into<Value>) -> Self {
    Self::new(vec!["set_property".into(), name.into(), value.into()])
  }

  pub fn set_pause(paused: bool) -> Self {
    Self::set_property("pause", paused)
  }

  /// MPV volume is 0-100 (more with --volume-max).
  pub fn set_volume(volume: f64) -> Self {
    Self::set_property("volume", volume)
  }

  pub fn set_mute(mute: bool) -> Self {
    Self::set_property("mute", mute)
  }

  pub fn observe_property(id: i64, name: &str) -> Self {
    Self::new(vec!["observe_property".into(), id.into(), name.into()])
  }

  pub fn quit() -> Self {
    Self::new(vec!["quit".into()])
  }
}

/// Response from MPV for a command.
#[derive(Debug, Clone, Deserialize)]
pub struct MpvResponse {
  /// "success" or error message.
  pub error: String,
  pub request_id: i64,
}

impl MpvResponse {
  pub fn is_success(&self) -> bool {
    self.error == "success"
  }
}

/// Event sent by MPV (property changes, playback events, etc.).
#[derive(Debug, Clone, Deserialize)]
pub struct MpvEvent {
  /// Event type (e.g., "property-change", "end-file", "file-loaded").
  pub event: String,
  pub name: Option<String>,
  pub data: Option<Value>,
  /// Reason for end-file events ("eof", "stop", "quit", "error", "redirect").
  pub reason: Option<String>,
}

impl MpvEvent {
  pub fn property(&self) -> Option<&str> {
    if self.event == "property-change" {
      self.name.as_deref()
    } else {
      None
    }
  }
}

/// Message received from MPV IPC (either response or event).
#[derive(Debug, Clone)]
pub enum MpvMessage {
  Response(MpvResponse),
  Event(MpvEvent),
}

impl MpvMessage {
  /// Parse a JSON line from MPV.
  pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;
    if value.get("event").is_some() {
      Ok(MpvMessage::Event(serde_json::from_value(value)?))
    } else {
      Ok(MpvMessage::Response(serde_json::from_value(value)?))
    }
  }
}

/// Pull the tags we care about out of MPV's `metadata` property.
///
/// Tag names vary in case between containers (`title` in Vorbis comments,
/// `TITLE` in Matroska, `icy-title` for streams), so lookups ignore case.
pub fn song_metadata(data: &Value) -> SongMetaData {
  let Some(map) = data.as_object() else {
    return SongMetaData::default();
  };

  let tag = |keys: &[&str]| -> Option<String> {
    keys.iter().find_map(|key| {
      map
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, v)| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
    })
  };

  SongMetaData {
    title: tag(&["title", "icy-title"]),
    artist: tag(&["artist", "album_artist"]),
    album: tag(&["album"]),
    genre: tag(&["genre", "icy-genre"]),
    composer: tag(&["composer"]),
  }
}
