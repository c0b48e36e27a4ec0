//! vigil — server daemon skeleton built around process-wide signal handling.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                   vigild                     │
//!                  │                                              │
//!   OS signals     │  ┌───────────┐      ┌──────────────────┐     │
//!   ──────────────▶│  │ lifecycle │─────▶│ ProcessLifecycle │     │
//!   ABRT FPE ILL   │  │  signals  │      │  startup flag +  │     │
//!   QUIT SEGV      │  └─────┬─────┘      │  shutdown gate   │     │
//!   INT TERM HUP   │        │            └────────┬─────────┘     │
//!   (PIPE ignored) │        ▼                     ▼               │
//!                  │  ┌────────────────┐   ┌─────────────┐        │
//!                  │  │ observability  │   │ main thread │        │
//!                  │  │ logging, stack │   │ gate.wait() │        │
//!                  │  └────────────────┘   └──────┬──────┘        │
//!                  │                              ▼               │
//!                  │  ┌─────────┐          ┌────────────┐         │
//!   status query   │  │   net   │◀─────────│  Shutdown  │         │
//!   ──────────────▶│  │listener │  stop    │ broadcast  │         │
//!                  │  └─────────┘          └────────────┘         │
//!                  └──────────────────────────────────────────────┘
//! ```
//!
//! Crash signals log build identity and a backtrace, then re-raise with the
//! default disposition restored so the OS still produces a core dump.
//! SIGINT/SIGTERM release the shutdown gate the main thread blocks on;
//! teardown itself belongs to the main thread. SIGHUP requests a log roll.

// Core subsystems
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod version;

pub use config::DaemonConfig;
pub use lifecycle::{ProcessLifecycle, Shutdown};
pub use net::StatusListener;
