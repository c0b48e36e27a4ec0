//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, via tracing)
//!
//! Crash handlers additionally produce:
//!     → stack.rs (best-effort backtrace, logged as an event)
//!
//! SIGHUP handler:
//!     → logging::request_log_roll() → sink reopens file on next write
//! ```
//!
//! # Design Decisions
//! - Everything reachable from signal context in this subsystem is either
//!   an atomic flag or a documented best-effort call

pub mod logging;
pub mod stack;
