//! Process lifecycle state shared with signal handlers.
//!
//! # Responsibilities
//! - Track whether startup has finished (read by the shutdown handler)
//! - Provide the shutdown gate the main thread blocks on
//!
//! # Design Decisions
//! - One context object, created by main and handed to `signals::setup`,
//!   rather than ambient globals; tests inject their own instance and
//!   drive dispatch directly
//! - The gate is a single atomic flag. Release happens inside a signal
//!   handler, where condvar notification and mutex unlocking are off the
//!   table, so the waiting side polls with short parks instead

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How long the waiting thread parks between gate checks.
const GATE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Gate the main thread holds until shutdown should begin.
///
/// `release` is async-signal-safe: one atomic swap, no locks, no allocation.
/// Releasing an already-released gate is a no-op.
#[derive(Debug, Default)]
pub struct ShutdownGate {
    released: AtomicBool,
}

impl ShutdownGate {
    /// Release the gate. Returns true if this call performed the
    /// held-to-released transition, false if it was already released.
    pub fn release(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }

    /// Whether the gate has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Block the calling thread until the gate is released.
    pub fn wait(&self) {
        while !self.is_released() {
            thread::park_timeout(GATE_POLL_INTERVAL);
        }
    }
}

/// Process-wide lifecycle state.
///
/// Created once by main, shared with the signal dispatch via `Arc`. The
/// startup flag is written exactly once, by main, when startup finishes;
/// signal handlers only ever read it.
#[derive(Debug, Default)]
pub struct ProcessLifecycle {
    startup_complete: AtomicBool,
    gate: ShutdownGate,
}

impl ProcessLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that startup has finished. Called once by main.
    pub fn mark_startup_complete(&self) {
        self.startup_complete.store(true, Ordering::Release);
    }

    /// Whether startup has finished.
    pub fn startup_complete(&self) -> bool {
        self.startup_complete.load(Ordering::Acquire)
    }

    /// The shutdown gate.
    pub fn gate(&self) -> &ShutdownGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn gate_release_is_idempotent() {
        let gate = ShutdownGate::default();
        assert!(!gate.is_released());
        assert!(gate.release());
        assert!(gate.is_released());
        assert!(!gate.release());
        assert!(gate.is_released());
    }

    #[test]
    fn wait_returns_after_release_from_another_thread() {
        let lifecycle = Arc::new(ProcessLifecycle::new());
        let waiter = {
            let lifecycle = Arc::clone(&lifecycle);
            std::thread::spawn(move || lifecycle.gate().wait())
        };
        std::thread::sleep(Duration::from_millis(20));
        assert!(lifecycle.gate().release());
        waiter.join().unwrap();
    }

    #[test]
    fn startup_flag_starts_false_and_latches() {
        let lifecycle = ProcessLifecycle::new();
        assert!(!lifecycle.startup_complete());
        lifecycle.mark_startup_complete();
        assert!(lifecycle.startup_complete());
    }
}
