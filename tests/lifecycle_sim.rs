//! Signal-episode simulations via direct dispatch calls.
//!
//! No real signals here: dispatch functions take an injected lifecycle
//! context, so episodes can be sequenced deterministically across threads.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use vigil::lifecycle::signals::{shutdown_dispatch, ShutdownDisposition};
use vigil::lifecycle::ProcessLifecycle;

#[test]
fn shutdown_before_startup_never_touches_the_gate() {
    let lifecycle = ProcessLifecycle::new();

    for sig in [libc::SIGINT, libc::SIGTERM] {
        assert_eq!(
            shutdown_dispatch(sig, &lifecycle),
            ShutdownDisposition::ExitImmediately
        );
    }
    assert!(!lifecycle.gate().is_released());
}

#[test]
fn gate_release_wakes_the_waiting_main_thread() {
    let lifecycle = Arc::new(ProcessLifecycle::new());
    lifecycle.mark_startup_complete();

    let waiter = {
        let lifecycle = Arc::clone(&lifecycle);
        thread::spawn(move || {
            lifecycle.gate().wait();
            true
        })
    };

    thread::sleep(Duration::from_millis(20));
    assert_eq!(
        shutdown_dispatch(libc::SIGTERM, &lifecycle),
        ShutdownDisposition::GateReleased
    );

    assert!(waiter.join().unwrap());
}

#[test]
fn int_then_term_in_quick_succession_is_harmless() {
    let lifecycle = Arc::new(ProcessLifecycle::new());
    lifecycle.mark_startup_complete();

    let handles: Vec<_> = [libc::SIGINT, libc::SIGTERM]
        .into_iter()
        .map(|sig| {
            let lifecycle = Arc::clone(&lifecycle);
            thread::spawn(move || shutdown_dispatch(sig, &lifecycle))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ShutdownDisposition::GateReleased);
    }
    assert!(lifecycle.gate().is_released());
}
