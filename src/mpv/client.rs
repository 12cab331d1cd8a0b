//! High-level MPV client: one spawned MPV process and its IPC connection.

use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;

use async_channel::Receiver;
use thiserror::Error;

use super::ipc::{IpcError, MpvIpc};
use super::process::{cleanup_ipc, spawn_mpv, ProcessError};
use super::protocol::{MpvCommand, MpvEvent, MpvResponse};

const CONNECT_ATTEMPTS: u32 = 20;

#[derive(Error, Debug)]
pub enum MpvError {
  #[error("Process error: {0}")]
  Process(#[from] ProcessError),
  #[error("IPC error: {0}")]
  Ipc(#[from] IpcError),
  #[error("MPV command failed: {0}")]
  CommandFailed(String),
  #[error("Not connected")]
  NotConnected,
}

/// How to launch MPV.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
  /// Explicit executable; `None` searches PATH and common locations.
  pub mpv_path: Option<PathBuf>,
  pub extra_args: Vec<String>,
  pub ipc_path: String,
}

/// Owns the MPV process. Dropping the client kills it.
pub struct MpvClient {
  process: Child,
  ipc_path: String,
  ipc: Option<MpvIpc>,
}

impl MpvClient {
  /// Spawn MPV. The IPC connection is made later with [`MpvClient::connect`],
  /// once a runtime is driving this client.
  pub fn spawn(options: &LaunchOptions) -> Result<Self, MpvError> {
    cleanup_ipc(&options.ipc_path);
    let process = spawn_mpv(
      options.mpv_path.as_deref(),
      &options.extra_args,
      &options.ipc_path,
    )?;
    Ok(Self {
      process,
      ipc_path: options.ipc_path.clone(),
      ipc: None,
    })
  }

  /// Connect to MPV's IPC server, retrying while it starts up.
  /// Gives up early if the process has already exited.
  pub async fn connect(&mut self) -> Result<(), MpvError> {
    let mut last_error = None;
    for attempt in 0..CONNECT_ATTEMPTS {
      if attempt > 0 {
        tokio::time::sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
      }
      if let Some(status) = self.process.try_wait().map_err(ProcessError::from)? {
        return Err(ProcessError::Exited(status).into());
      }

      match MpvIpc::connect(&self.ipc_path).await {
        Ok(ipc) => {
          self.ipc = Some(ipc);
          log::info!("MPV client connected (pid: {})", self.process.id());
          return Ok(());
        }
        Err(e) => {
          log::debug!("IPC connect attempt {} failed: {}", attempt + 1, e);
          last_error = Some(e);
        }
      }
    }

    Err(
      last_error
        .unwrap_or_else(|| IpcError::ConnectionFailed("no attempts made".into()))
        .into(),
    )
  }

  /// Event receiver; `None` until connected.
  pub fn events(&self) -> Option<Receiver<MpvEvent>> {
    self.ipc.as_ref().map(MpvIpc::events)
  }

  async fn send(&self, cmd: MpvCommand) -> Result<MpvResponse, MpvError> {
    let ipc = self.ipc.as_ref().ok_or(MpvError::NotConnected)?;
    let response = ipc.send_command(cmd).await?;
    if !response.is_success() {
      return Err(MpvError::CommandFailed(response.error));
    }
    Ok(response)
  }

  pub async fn loadfile(&self, url: &str) -> Result<(), MpvError> {
    log::info!("Loading file: {}", url);
    self.send(MpvCommand::loadfile(url)).await?;
    Ok(())
  }

  /// Seek to absolute position in seconds.
  pub async fn seek(&self, seconds: f64) -> Result<(), MpvError> {
    self.send(MpvCommand::seek(seconds)).await?;
    Ok(())
  }

  pub async fn set_pause(&self, paused: bool) -> Result<(), MpvError> {
    self.send(MpvCommand::set_pause(paused)).await?;
    Ok(())
  }

  /// Stop playback; MPV keeps running idle.
  pub async fn stop(&self) -> Result<(), MpvError> {
    self.send(MpvCommand::stop()).await?;
    Ok(())
  }

  /// Set volume (0-100).
  pub async fn set_volume(&self, volume: f64) -> Result<(), MpvError> {
    self.send(MpvCommand::set_volume(volume)).await?;
    Ok(())
  }

  pub async fn set_mute(&self, mute: bool) -> Result<(), MpvError> {
    self.send(MpvCommand::set_mute(mute)).await?;
    Ok(())
  }

  /// Observe a property; changes arrive on [`MpvClient::events`].
  pub async fn observe_property(&self, observer_id: i64, property: &str) -> Result<(), MpvError> {
    self.send(MpvCommand::observe_property(observer_id, property)).await?;
    Ok(())
  }

  /// Ask MPV to quit; the process is killed on drop regardless.
  pub async fn quit(&mut self) {
    if let Some(ipc) = self.ipc.take() {
      let _ = ipc.send_command(MpvCommand::quit()).await;
      ipc.close();
    }
  }
}

impl Drop for MpvClient {
  fn drop(&mut self) {
    self.ipc = None;
    let pid = self.process.id();
    match self.process.try_wait() {
      Ok(Some(status)) => log::info!("MPV process {} exited with: {}", pid, status),
      _ => {
        if let Err(e) = self.process.kill() {
          log::error!("Failed to kill MPV process {}: {}", pid, e);
        }
        let _ = self.process.wait();
        log::info!("MPV process {} stopped", pid);
      }
    }
    cleanup_ipc(&self.ipc_path);
  }
}
