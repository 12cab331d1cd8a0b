//! Process loop driver.

use tokio::runtime::{Builder, Runtime};

/// Single-threaded cooperative scheduler shared by every output module.
///
/// Modules spawn their timers, IPC readers and workers onto [`MainLoop::runtime`].
/// Nothing runs until [`MainLoop::run`] is called.
pub struct MainLoop {
  runtime: Runtime,
}

impl MainLoop {
  pub fn new() -> std::io::Result<Self> {
    let runtime = Builder::new_current_thread()
      .enable_all()
      .build()?;
    Ok(Self { runtime })
  }

  pub fn runtime(&self) -> &Runtime {
    &self.runtime
  }

  /// Block the calling thread until the process is asked to terminate.
  pub fn run(self) {
    log::info!("Entering main loop");
    self.runtime.block_on(async {
      match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Termination requested, leaving main loop"),
        Err(e) => {
          // Without a signal handler the loop simply never ends.
          log::warn!("Failed to listen for termination signal: {}", e);
          std::future::pending::<()>().await;
        }
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  #[test]
  fn test_spawned_work_waits_for_the_loop() {
    let main_loop = MainLoop::new().unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let task = main_loop.runtime().spawn(async move {
      flag.store(true, Ordering::SeqCst);
    });
    assert!(!ran.load(Ordering::SeqCst));

    main_loop.runtime.block_on(task).unwrap();
    assert!(ran.load(Ordering::SeqCst));
  }
}
