//! Cooperative cancellation for long scans.
//!
//! The walker polls a [`CancellationToken`] at the start of every directory
//! visit. Directory boundaries are the only interruption points, so a
//! cancelled scan never reports a half-computed size/recency pair.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Uses `Ordering::Relaxed`: the walker only needs to observe the flag
/// eventually, not in any order relative to other memory.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    /// Once set, the next SIGINT/SIGTERM ends the process instead of
    /// only setting `flag`.
    terminate: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Make any further interrupt terminate the process (exit `128 + signo`).
    ///
    /// Called once the cooperative phase is over, so Ctrl-C at a prompt or
    /// during deletion aborts the run instead of being swallowed.
    pub fn terminate_on_interrupt(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }

    pub fn terminates_on_interrupt(&self) -> bool {
        self.terminate.load(Ordering::Relaxed)
    }

    /// Route SIGINT and SIGTERM into this token.
    ///
    /// The first signal sets the cancellation flag and arms termination; a
    /// second one, or any signal after [`terminate_on_interrupt`], exits.
    /// Registration is best-effort; failures are reported on stderr and the
    /// process keeps its default signal handling.
    ///
    /// [`terminate_on_interrupt`]: Self::terminate_on_interrupt
    #[cfg(feature = "signals")]
    pub fn register_interrupts(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::flag;

        for (signal, name) in [(SIGINT, "SIGINT"), (SIGTERM, "SIGTERM")] {
            // The shutdown check must be registered before the flags it reads.
            let registered = flag::register_conditional_shutdown(
                signal,
                128 + signal,
                Arc::clone(&self.terminate),
            )
            .and_then(|_| flag::register(signal, Arc::clone(&self.flag)))
            .and_then(|_| flag::register(signal, Arc::clone(&self.terminate)));
            if let Err(e) = registered {
                eprintln!("[DC-SIGNAL] failed to register {name}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn termination_is_armed_separately_from_cancellation() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.terminate_on_interrupt();
        assert!(observer.terminates_on_interrupt());
        assert!(!observer.is_cancelled());
    }

    #[cfg(feature = "signals")]
    #[test]
    fn registering_interrupts_does_not_cancel() {
        let token = CancellationToken::new();
        token.register_interrupts();
        assert!(!token.is_cancelled());
        assert!(!token.terminates_on_interrupt());
    }
}
