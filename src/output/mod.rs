//! Output module frontend.
//!
//! Architecture:
//! - `module.rs` - `OutputModule` trait, callback and value types
//! - `registry.rs` - ordered table of modules, first one is the default
//! - `dispatch.rs` - `Output`: selection plus the command surface the control layer calls
//! - `options.rs` - per-module command line option registration
//! - `main_loop.rs` - the cooperative loop modules schedule their work on
//! - `dummy.rs` - no-op module

mod dispatch;
pub mod dummy;
mod error;
mod main_loop;
mod module;
mod options;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::Output;
pub use error::{OutputError, Result};
pub use main_loop::MainLoop;
pub use module::{
  InitContext, MetadataCallback, OutputModule, PlayFeedback, SongMetaData, TrackPosition,
  TransitionCallback,
};
pub use options::OptionContext;
pub use registry::OutputRegistry;
