//! Async IPC connection to MPV.
//!
//! One reader task and one writer task per connection. Responses are matched to
//! requests by `request_id`; everything else is forwarded as an event.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::protocol::{MpvCommand, MpvEvent, MpvMessage, MpvResponse};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum IpcError {
  #[error("Connection failed: {0}")]
  ConnectionFailed(String),
  #[error("Write failed: {0}")]
  WriteFailed(#[from] std::io::Error),
  #[error("Command timeout")]
  Timeout,
  #[error("Disconnected")]
  Disconnected,
}

type PendingRequest = oneshot::Sender<MpvResponse>;

/// Requests waiting for a response. `closed` is set once the reader has exited.
#[derive(Default)]
struct PendingState {
  requests: HashMap<i64, PendingRequest>,
  closed: bool,
}

type Pending = Arc<Mutex<PendingState>>;

enum WriteMessage {
  Command(Vec<u8>),
  Close,
}

/// MPV IPC connection.
pub struct MpvIpc {
  pending: Pending,
  write_tx: Sender<WriteMessage>,
  event_rx: Receiver<MpvEvent>,
  reader_handle: JoinHandle<()>,
  writer_handle: JoinHandle<()>,
}

impl MpvIpc {
  /// Connect to the MPV pipe. Fails if MPV is not listening yet.
  #[cfg(windows)]
  pub async fn connect(path: &str) -> Result<Self, IpcError> {
    use tokio::net::windows::named_pipe::ClientOptions;

    let client = ClientOptions::new()
      .open(path)
      .map_err(|e| IpcError::ConnectionFailed(format!("Failed to open pipe: {}", e)))?;

    let (reader, writer) = tokio::io::split(client);
    Ok(Self::from_parts(reader, writer))
  }

  /// Connect to the MPV socket. Fails if MPV is not listening yet.
  #[cfg(not(windows))]
  pub async fn connect(path: &str) -> Result<Self, IpcError> {
    use tokio::net::UnixStream;

    let stream = UnixStream::connect(path)
      .await
      .map_err(|e| IpcError::ConnectionFailed(e.to_string()))?;

    let (reader, writer) = tokio::io::split(stream);
    Ok(Self::from_parts(reader, writer))
  }

  /// Wrap an already-open duplex stream. Must be called from within the runtime.
  pub fn from_parts<R, W>(reader: R, writer: W) -> Self
  where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
  {
    let pending: Pending = Arc::new(Mutex::new(PendingState::default()));
    let (event_tx, event_rx) = async_channel::unbounded();
    let (write_tx, write_rx) = async_channel::unbounded();

    let reader_handle = tokio::spawn(reader_loop(reader, pending.clone(), event_tx));
    let writer_handle = tokio::spawn(writer_loop(writer, write_rx));

    Self {
      pending,
      write_tx,
      event_rx,
      reader_handle,
      writer_handle,
    }
  }

  /// Send a command and wait for MPV's response.
  pub async fn send_command(&self, cmd: MpvCommand) -> Result<MpvResponse, IpcError> {
    let request_id = cmd.request_id;
    let (tx, rx) = oneshot::channel();
    {
      let mut pending = self.pending.lock();
      if pending.closed {
        return Err(IpcError::Disconnected);
      }
      pending.requests.insert(request_id, tx);
    }

    let json = serde_json::to_vec(&cmd).map_err(|e| IpcError::WriteFailed(e.into()))?;
    log::debug!("Sending MPV command: {}", String::from_utf8_lossy(&json));

    if self.write_tx.send(WriteMessage::Command(json)).await.is_err() {
      self.pending.lock().requests.remove(&request_id);
      return Err(IpcError::Disconnected);
    }

    match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
      Ok(Ok(response)) => Ok(response),
      // Reader dropped every pending sender: the connection is gone.
      Ok(Err(_)) => Err(IpcError::Disconnected),
      Err(_) => {
        log::error!("MPV command timeout, request_id={}", request_id);
        self.pending.lock().requests.remove(&request_id);
        Err(IpcError::Timeout)
      }
    }
  }

  /// Receiver for property changes and playback events.
  pub fn events(&self) -> Receiver<MpvEvent> {
    self.event_rx.clone()
  }

  pub fn close(&self) {
    let _ = self.write_tx.try_send(WriteMessage::Close);
  }
}

impl Drop for MpvIpc {
  fn drop(&mut self) {
    self.write_tx.close();
    self.reader_handle.abort();
    self.writer_handle.abort();
  }
}

async fn reader_loop<R: AsyncRead + Unpin>(reader: R, pending: Pending, event_tx: Sender<MpvEvent>) {
  let mut lines = BufReader::new(reader).lines();

  loop {
    match lines.next_line().await {
      Ok(Some(line)) => {
        let trimmed = line.trim();
        if trimmed.is_empty() {
          continue;
        }
        match MpvMessage::parse(trimmed) {
          Ok(MpvMessage::Response(response)) => {
            if let Some(tx) = pending.lock().requests.remove(&response.request_id) {
              let _ = tx.send(response);
            }
          }
          Ok(MpvMessage::Event(event)) => {
            log::trace!("MPV event: {:?}", event);
            if event_tx.send(event).await.is_err() {
              break;
            }
          }
          Err(e) => log::warn!("Failed to parse MPV message: {} - {}", e, trimmed),
        }
      }
      Ok(None) => {
        log::info!("MPV IPC connection closed");
        break;
      }
      Err(e) => {
        log::error!("MPV IPC read error: {}", e);
        break;
      }
    }
  }

  // Wake up everyone still waiting for a response.
  let mut pending = pending.lock();
  pending.closed = true;
  pending.requests.clear();
}

async fn writer_loop<W: AsyncWrite + Unpin>(mut writer: W, write_rx: Receiver<WriteMessage>) {
  while let Ok(msg) = write_rx.recv().await {
    let WriteMessage::Command(mut data) = msg else {
      log::debug!("MPV IPC writer closing");
      break;
    };
    data.push(b'\n');
    if let Err(e) = writer.write_all(&data).await {
      log::error!("MPV IPC write error: {}", e);
      break;
    }
    if let Err(e) = writer.flush().await {
      log::error!("MPV IPC flush error: {}", e);
      break;
    }
  }
}
