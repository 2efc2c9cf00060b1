//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared between the signal handler and the
//! pipeline. The walker and the hasher stop early when it is set; the link
//! executor only looks at it between two swaps, so a swap that has already
//! moved a file to its backup always runs to completion or rolls back.
//!
//! ```rust,no_run
//! use linkdupe::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let flag = handler.get_flag();
//! // pass `flag` to DedupConfig::with_shutdown_flag
//! # let _ = flag;
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + 2.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown as if Ctrl+C had been pressed.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to the walker, hasher and link executor.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that sets the shutdown flag.
///
/// The process-wide handler is installed once; later calls (several
/// `run_app` invocations in one test binary, for instance) get the same
/// handler back with its flag cleared.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS handler cannot be
/// registered and no handler was installed before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Finishing the current file..."
        );
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            fallback.reset();
            Ok(fallback.clone())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handler_not_requested() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_and_reset() {
        let handler = ShutdownHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
        handler.reset();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_flag_is_shared() {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_shutdown_requested());
        assert!(handler.clone().is_shutdown_requested());
    }

    #[test]
    fn test_install_twice_returns_cleared_handler() {
        let first = install_handler().unwrap();
        first.request_shutdown();
        let second = install_handler().unwrap();
        assert!(!second.is_shutdown_requested());
    }

    #[test]
    fn test_exit_code_interrupted() {
        assert_eq!(EXIT_CODE_INTERRUPTED, 130);
    }

    #[test]
    fn test_shutdown_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShutdownHandler>();
    }
}
