//! Network subsystem: the daemon's status listener.

pub mod listener;

pub use listener::{ListenerError, StatusListener};
