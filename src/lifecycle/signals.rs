//! OS signal handling.
//!
//! # Responsibilities
//! - Map each managed signal to an action (crash report, shutdown, log roll,
//!   ignore) and install one handler per signal at startup
//! - Crash signals: log build identity, dump a backtrace, restore the default
//!   disposition and re-raise so the OS still produces a core dump
//! - SIGINT/SIGTERM: release the shutdown gate (or exit immediately if
//!   startup never finished)
//! - SIGHUP: request a log roll
//! - SIGPIPE: ignore, so writes to broken pipes fail with EPIPE instead of
//!   killing the process
//!
//! # Design Decisions
//! - Raw `libc::signal` handlers, not tokio's signal streams: crash signals
//!   are synchronous faults that must be handled on the faulting thread,
//!   before any executor gets a chance to run
//! - One shared handler per signal group, parameterized by the delivered
//!   signal number; the decision logic lives in plain functions that tests
//!   call directly with an injected [`ProcessLifecycle`]
//! - Handlers run in asynchronous-signal context. Everything they touch is
//!   atomics, constants, and the tracing macros; the tracing calls are the
//!   one deliberate deviation from strict async-signal-safety, kept in this
//!   module so the exposure is auditable in one place
//!
//! # Known Limitation
//! A second delivery of the same crash signal racing the first, before the
//! handler restores the default disposition, re-enters the handler. The
//! backtrace printer refuses to recurse, and the re-entered handler falls
//! through to the restore-and-reraise step, so termination still happens.

use std::io;
use std::sync::Arc;

use libc::c_int;
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::lifecycle::context::ProcessLifecycle;
use crate::observability::{logging, stack};
use crate::version;

/// Exit status for a failed handler-integrity check during crash handling.
/// Distinct from both the clean-exit status and termination-by-signal, so
/// operators can tell the paths apart post-mortem.
pub const EXIT_HANDLER_MISMATCH: c_int = -1;

/// What a managed signal triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Log build identity, dump a backtrace, re-raise for a core dump.
    CrashReport,
    /// Release the shutdown gate (or exit if startup never finished).
    ShutdownRequest,
    /// Ask the logging subsystem to reopen its file.
    LogRoll,
    /// Configure the OS to ignore the signal entirely.
    Ignore,
}

/// The complete set of managed signals and their actions.
pub const SIGNAL_TABLE: &[(c_int, SignalAction)] = &[
    (libc::SIGABRT, SignalAction::CrashReport),
    (libc::SIGFPE, SignalAction::CrashReport),
    (libc::SIGHUP, SignalAction::LogRoll),
    (libc::SIGILL, SignalAction::CrashReport),
    (libc::SIGINT, SignalAction::ShutdownRequest),
    (libc::SIGPIPE, SignalAction::Ignore),
    (libc::SIGQUIT, SignalAction::CrashReport),
    (libc::SIGSEGV, SignalAction::CrashReport),
    (libc::SIGTERM, SignalAction::ShutdownRequest),
];

/// Static name lookup, usable from signal context (no allocation).
pub fn signal_name(sig: c_int) -> &'static str {
    match sig {
        libc::SIGABRT => "SIGABRT",
        libc::SIGFPE => "SIGFPE",
        libc::SIGHUP => "SIGHUP",
        libc::SIGILL => "SIGILL",
        libc::SIGINT => "SIGINT",
        libc::SIGPIPE => "SIGPIPE",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGTERM => "SIGTERM",
        _ => "unknown",
    }
}

/// Error type for handler installation.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("could not register signal handler for {signal}: {source}")]
    Register {
        signal: &'static str,
        source: io::Error,
    },
}

// Lifecycle context the extern "C" handlers read. Set once by setup(),
// before any handler is installed.
static LIFECYCLE: OnceCell<Arc<ProcessLifecycle>> = OnceCell::new();

/// Install handlers for every signal in [`SIGNAL_TABLE`].
///
/// Called exactly once at startup, before any thread that could receive a
/// managed signal exists. Installation failure for a handled signal is
/// unrecoverable: the daemon cannot guarantee safe crash or shutdown
/// behavior without its handlers, so setup stops at the first failure and
/// the caller treats the error as fatal.
///
/// A second call warns and leaves the existing installation alone.
pub fn setup(lifecycle: &Arc<ProcessLifecycle>) -> Result<(), SignalError> {
    if LIFECYCLE.set(Arc::clone(lifecycle)).is_err() {
        tracing::warn!("signal handlers already installed, ignoring repeat setup");
        return Ok(());
    }

    for &(sig, action) in SIGNAL_TABLE {
        match action {
            SignalAction::CrashReport => register_handler(sig, handle_crash)?,
            SignalAction::ShutdownRequest => register_handler(sig, handle_shutdown)?,
            SignalAction::LogRoll => register_handler(sig, handle_log_roll)?,
            SignalAction::Ignore => ignore_signal(sig),
        }
    }

    Ok(())
}

/// Install `handler` for `sig`, failing on OS error and warning if a
/// previous handler was unexpectedly present.
fn register_handler(
    sig: c_int,
    handler: extern "C" fn(c_int),
) -> Result<(), SignalError> {
    let previous = unsafe { libc::signal(sig, handler as libc::sighandler_t) };

    if previous == libc::SIG_ERR {
        return Err(SignalError::Register {
            signal: signal_name(sig),
            source: io::Error::last_os_error(),
        });
    }

    if previous != libc::SIG_DFL {
        // Some platforms occasionally report a bogus non-default previous
        // handler even though registration succeeded, so warn and proceed.
        tracing::warn!(
            signal = signal_name(sig),
            previous_handler = previous,
            "replaced an unexpected existing signal handler"
        );
    }

    Ok(())
}

/// Configure the OS to ignore `sig`, with the sigaction mask scoped to
/// exactly this one signal. Failure is a warning, not fatal: the daemon can
/// run without it, it just dies on the next broken-pipe write.
fn ignore_signal(sig: c_int) {
    unsafe {
        let mut act: libc::sigaction = std::mem::zeroed();
        act.sa_sigaction = libc::SIG_IGN;
        libc::sigemptyset(&mut act.sa_mask);
        libc::sigaddset(&mut act.sa_mask, sig);

        if libc::sigaction(sig, &act, std::ptr::null_mut()) != 0 {
            tracing::warn!(signal = signal_name(sig), "could not ignore signal");
        }
    }
}

/// Restore the default disposition for `sig` and re-raise it so the OS
/// performs its default action (typically termination with a core dump).
///
/// The displaced handler must be `expected`; anything else means the
/// disposition was tampered with or raced, and re-raising could loop back
/// into an unknown handler forever. In that case exit immediately with a
/// distinct status.
fn restore_default_and_reraise(sig: c_int, expected: extern "C" fn(c_int)) {
    let previous = unsafe { libc::signal(sig, libc::SIG_DFL) };

    if previous != expected as libc::sighandler_t {
        tracing::warn!(
            signal = signal_name(sig),
            "could not restore default signal disposition, exiting"
        );
        unsafe { libc::_exit(EXIT_HANDLER_MISMATCH) };
    }

    unsafe {
        libc::raise(sig);
    }
}

/// What the shutdown handler should do after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownDisposition {
    /// Startup never finished; nothing to tear down, exit with status 0.
    ExitImmediately,
    /// Gate released (or already released); return from signal context and
    /// let the main thread run teardown.
    GateReleased,
}

/// Shutdown decision logic, shared by SIGINT and SIGTERM.
///
/// Split out from the `extern "C"` handler so tests can drive it with their
/// own lifecycle context instead of raising real signals.
pub fn shutdown_dispatch(sig: c_int, lifecycle: &ProcessLifecycle) -> ShutdownDisposition {
    tracing::warn!(signal = signal_name(sig), "shutdown signal received");

    if !lifecycle.startup_complete() {
        tracing::warn!("startup was not complete, exiting immediately");
        return ShutdownDisposition::ExitImmediately;
    }

    lifecycle.gate().release();
    ShutdownDisposition::GateReleased
}

/// Log-roll logic for SIGHUP. Sets a flag the log sink consumes; the actual
/// reopen happens outside signal context, on the next log write.
pub fn log_roll_dispatch(sig: c_int) {
    tracing::info!(signal = signal_name(sig), "rolling log");
    logging::request_log_roll();
}

// Shared by SIGABRT, SIGFPE, SIGILL, SIGQUIT, SIGSEGV. Runs on whatever
// thread the fault (or delivery) landed on. Never returns to normal
// execution: either the re-raised signal terminates the process or the
// integrity check exits first.
extern "C" fn handle_crash(sig: c_int) {
    tracing::warn!(
        signal = signal_name(sig),
        build_type = version::BUILD_TYPE,
        build_id = version::BUILD_ID,
        build_os = version::BUILD_OS,
        "crash signal received, aborting"
    );

    stack::print_stack_trace();
    restore_default_and_reraise(sig, handle_crash);
}

// Shared by SIGINT and SIGTERM.
extern "C" fn handle_shutdown(sig: c_int) {
    let Some(lifecycle) = LIFECYCLE.get() else {
        // Handlers are installed after the context is stored, so this only
        // fires if a shutdown signal arrives mid-setup. Treat it like the
        // startup-incomplete path.
        unsafe { libc::_exit(0) };
    };

    if shutdown_dispatch(sig, lifecycle) == ShutdownDisposition::ExitImmediately {
        unsafe { libc::_exit(0) };
    }
}

extern "C" fn handle_log_roll(sig: c_int) {
    log_roll_dispatch(sig);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_nine_managed_signals() {
        assert_eq!(SIGNAL_TABLE.len(), 9);

        let action_for = |sig| {
            SIGNAL_TABLE
                .iter()
                .find(|(s, _)| *s == sig)
                .map(|(_, a)| *a)
                .unwrap()
        };

        for sig in [
            libc::SIGABRT,
            libc::SIGFPE,
            libc::SIGILL,
            libc::SIGQUIT,
            libc::SIGSEGV,
        ] {
            assert_eq!(action_for(sig), SignalAction::CrashReport);
        }
        for sig in [libc::SIGINT, libc::SIGTERM] {
            assert_eq!(action_for(sig), SignalAction::ShutdownRequest);
        }
        assert_eq!(action_for(libc::SIGHUP), SignalAction::LogRoll);
        assert_eq!(action_for(libc::SIGPIPE), SignalAction::Ignore);
    }

    #[test]
    fn every_managed_signal_has_a_name() {
        for &(sig, _) in SIGNAL_TABLE {
            assert_ne!(signal_name(sig), "unknown");
        }
        assert_eq!(signal_name(libc::SIGUSR1), "unknown");
    }

    #[test]
    fn shutdown_before_startup_exits_without_touching_gate() {
        let lifecycle = ProcessLifecycle::new();
        let disposition = shutdown_dispatch(libc::SIGTERM, &lifecycle);
        assert_eq!(disposition, ShutdownDisposition::ExitImmediately);
        assert!(!lifecycle.gate().is_released());
    }

    #[test]
    fn shutdown_after_startup_releases_gate_once() {
        let lifecycle = ProcessLifecycle::new();
        lifecycle.mark_startup_complete();

        assert_eq!(
            shutdown_dispatch(libc::SIGINT, &lifecycle),
            ShutdownDisposition::GateReleased
        );
        assert!(lifecycle.gate().is_released());

        // SIGTERM arriving right after SIGINT: the second release is a no-op.
        assert_eq!(
            shutdown_dispatch(libc::SIGTERM, &lifecycle),
            ShutdownDisposition::GateReleased
        );
        assert!(lifecycle.gate().is_released());
    }

    #[test]
    fn log_roll_dispatch_requests_roll_and_leaves_lifecycle_alone() {
        let _guard = logging::ROLL_TEST_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        logging::clear_roll_request();

        let lifecycle = ProcessLifecycle::new();
        log_roll_dispatch(libc::SIGHUP);
        assert!(!lifecycle.startup_complete());
        assert!(!lifecycle.gate().is_released());
        assert!(logging::roll_pending());
        logging::clear_roll_request();
    }

    #[test]
    fn handler_mismatch_status_is_nonzero_and_distinct() {
        // -1 surfaces as 255 via _exit, distinct from the clean exit 0.
        assert_ne!(EXIT_HANDLER_MISMATCH, 0);
    }
}
