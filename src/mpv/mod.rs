//! MPV output module - drives an external MPV player via JSON IPC.
//!
//! Architecture:
//! - `process.rs` - MPV binary detection and process spawning
//! - `ipc.rs` - Async IPC connection (Named Pipes on Windows, Unix Sockets on Linux/macOS)
//! - `protocol.rs` - JSON command/response types and metadata extraction
//! - `client.rs` - MPV process plus connection, with command methods
//! - `output.rs` - `OutputModule` implementation and its event worker

mod client;
mod ipc;
mod output;
mod process;
mod protocol;

pub use client::MpvError;
pub use output::MpvOutput;
pub use process::find_mpv;
