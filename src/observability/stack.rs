//! Best-effort backtrace printing for crash context.

use std::sync::atomic::{AtomicBool, Ordering};

use backtrace::Backtrace;

// One printer at a time, process-wide. A fault inside the printer would
// re-enter the crash handler; the flag makes the nested call bail out
// instead of looping.
static IN_PROGRESS: AtomicBool = AtomicBool::new(false);

/// Capture and log the current thread's backtrace.
///
/// Best-effort: symbol resolution allocates, which is not safe in every
/// crash state. Callers treat a missing trace as acceptable; the crash
/// handler continues to termination regardless.
pub fn print_stack_trace() {
    if IN_PROGRESS.swap(true, Ordering::AcqRel) {
        return;
    }

    let trace = Backtrace::new();
    tracing::warn!("stack trace:\n{:?}", trace);

    IN_PROGRESS.store(false, Ordering::Release);
}
