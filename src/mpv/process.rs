//! MPV binary detection and process spawning.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
  #[error("MPV executable not found")]
  NotFound,
  #[error("Failed to spawn MPV: {0}")]
  SpawnFailed(#[from] std::io::Error),
  #[error("MPV exited during startup ({0})")]
  Exited(std::process::ExitStatus),
}

/// IPC socket/pipe path for the MPV instance owned by this process.
pub fn ipc_path() -> String {
  let pid = std::process::id();
  #[cfg(windows)]
  {
    format!(r"\\.\pipe\mediarender-mpv-{}", pid)
  }
  #[cfg(not(windows))]
  {
    std::env::temp_dir()
      .join(format!("mediarender-mpv-{}.sock", pid))
      .to_string_lossy()
      .into_owned()
  }
}

/// Find MPV executable on PATH or in common install locations.
pub fn find_mpv() -> Option<PathBuf> {
  if let Ok(path) = which::which("mpv") {
    return Some(path);
  }

  #[cfg(windows)]
  let common_paths: &[&str] = &[
    r"C:\Program Files\mpv\mpv.exe",
    r"C:\Program Files (x86)\mpv\mpv.exe",
    r"C:\mpv\mpv.exe",
  ];
  #[cfg(target_os = "macos")]
  let common_paths: &[&str] = &[
    "/usr/local/bin/mpv",
    "/opt/homebrew/bin/mpv",
    "/Applications/mpv.app/Contents/MacOS/mpv",
  ];
  #[cfg(not(any(windows, target_os = "macos")))]
  let common_paths: &[&str] = &["/usr/bin/mpv", "/usr/local/bin/mpv"];

  common_paths
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

/// Arguments that put MPV into headless renderer mode, listening on `ipc`.
pub fn renderer_args(ipc: &str) -> Vec<String> {
  vec![
    format!("--input-ipc-server={}", ipc),
    "--idle=yes".to_string(),
    "--keep-open=no".to_string(),
    "--gapless-audio=weak".to_string(),
    "--no-terminal".to_string(),
    "--no-config".to_string(),
  ]
}

/// Spawn MPV in idle mode with its IPC server on `ipc`.
pub fn spawn_mpv(
  mpv_path: Option<&Path>,
  extra_args: &[String],
  ipc: &str,
) -> Result<Child, ProcessError> {
  let mpv_exe = mpv_path
    .map(Path::to_path_buf)
    .or_else(find_mpv)
    .ok_or(ProcessError::NotFound)?;

  log::info!("Spawning MPV: {:?} with IPC: {}", mpv_exe, ipc);
  if !extra_args.is_empty() {
    log::info!("Extra MPV args: {:?}", extra_args);
  }

  let child = Command::new(&mpv_exe)
    .args(renderer_args(ipc))
    .args(extra_args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()?;

  Ok(child)
}

/// Remove a stale IPC socket.
pub fn cleanup_ipc(path: &str) {
  #[cfg(not(windows))]
  {
    let _ = std::fs::remove_file(path);
  }
  // Windows named pipes go away with the server
  #[cfg(windows)]
  let _ = path;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_renderer_args_point_at_ipc() {
    let args = renderer_args("/tmp/x.sock");
    assert_eq!(args[0], "--input-ipc-server=/tmp/x.sock");
    assert!(args.iter().any(|a| a == "--idle=yes"));
  }

  #[test]
  fn test_ipc_path_is_per_process() {
    assert!(ipc_path().contains(&std::process::id().to_string()));
  }

  #[test]
  fn test_spawn_missing_binary_fails() {
    let err = spawn_mpv(
      Some(Path::new("/nonexistent/definitely-not-mpv")),
      &[],
      "/tmp/unused.sock",
    )
    .unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed(_)));
  }
}
