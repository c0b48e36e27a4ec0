//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → signals::setup → Start listener
//!     → mark_startup_complete → gate.wait()
//!
//! Signals (signals.rs):
//!     SIGABRT/SIGFPE/SIGILL/SIGQUIT/SIGSEGV → log + backtrace + re-raise
//!     SIGINT/SIGTERM → release shutdown gate (or exit if mid-startup)
//!     SIGHUP → request log roll
//!     SIGPIPE → ignored
//!
//! Teardown (shutdown.rs):
//!     gate released → Shutdown::trigger → tasks stop → runtime drained
//! ```
//!
//! # Design Decisions
//! - The signal handlers decide *that* shutdown begins, never *how*;
//!   teardown order belongs to the main thread
//! - Lifecycle state lives in one context object, not ambient globals

pub mod context;
pub mod shutdown;
pub mod signals;

pub use context::{ProcessLifecycle, ShutdownGate};
pub use shutdown::Shutdown;
pub use signals::{setup, SignalAction, SignalError};
