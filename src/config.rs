//! Application configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR: &str = "mediarender";
const CONFIG_FILE: &str = "config.json";
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Invalid config file {path}: {source}")]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("{0}")]
  Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
  /// Output module to use (None = registry default).
  #[serde(default)]
  pub output: Option<String>,

  /// Custom MPV executable path (None = auto-detect).
  #[serde(default)]
  pub mpv_path: Option<String>,

  /// Additional MPV command-line arguments.
  #[serde(default)]
  pub mpv_args: Vec<String>,

  /// Default log filter when RUST_LOG is not set.
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      output: None,
      mpv_path: None,
      mpv_args: Vec::new(),
      log_level: default_log_level(),
    }
  }
}

impl AppConfig {
  /// `<config dir>/mediarender/config.json`, if the platform has a config dir.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
  }

  /// Load from `path`. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = match std::fs::read_to_string(path) {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Io {
          path: path.to_path_buf(),
          source,
        })
      }
    };

    let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
      return Err(ConfigError::Invalid(format!(
        "Log level must be one of {}",
        LOG_LEVELS.join(", ")
      )));
    }
    if matches!(&self.output, Some(name) if name.trim().is_empty()) {
      return Err(ConfigError::Invalid("Output module name cannot be empty".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, AppConfig::default());
  }

  #[test]
  fn test_partial_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"output":"mpv","mpvArgs":["--vo=null"]}}"#).unwrap();
    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.output.as_deref(), Some("mpv"));
    assert_eq!(config.mpv_args, vec!["--vo=null".to_string()]);
    assert_eq!(config.log_level, "info");
    assert!(config.mpv_path.is_none());
  }

  #[test]
  fn test_invalid_json_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();
    assert!(matches!(AppConfig::load(file.path()), Err(ConfigError::Json { .. })));
  }

  #[test]
  fn test_validate_rejects_unknown_log_level() {
    let config = AppConfig {
      log_level: "chatty".into(),
      ..AppConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config = AppConfig {
      output: Some("  ".into()),
      ..AppConfig::default()
    };
    assert!(config.validate().is_err());
  }
}
