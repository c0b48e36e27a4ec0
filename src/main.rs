//! vigild — daemon entry point.
//!
//! Wire-up only: load config, init logging, install signal handlers, start
//! the status listener, then block on the shutdown gate until a signal
//! handler releases it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use vigil::config::{self, DaemonConfig};
use vigil::lifecycle::{signals, ProcessLifecycle, Shutdown};
use vigil::net::StatusListener;
use vigil::observability::logging;
use vigil::version;

/// How long teardown waits for in-flight tasks before giving up.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "vigild", version, about = "vigil server daemon")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => DaemonConfig::default(),
    };

    logging::init(&config.logging)?;

    tracing::info!(
        build_type = version::BUILD_TYPE,
        build_id = version::BUILD_ID,
        build_os = version::BUILD_OS,
        "vigild starting"
    );

    // Handlers must be in place before any thread can receive a managed
    // signal, so this precedes the runtime.
    let lifecycle = Arc::new(ProcessLifecycle::new());
    signals::setup(&lifecycle)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let shutdown = Shutdown::new();
    let started = Instant::now();

    let listener = runtime.block_on(StatusListener::bind(&config.listener))?;
    runtime.spawn(listener.run(shutdown.subscribe(), started));

    lifecycle.mark_startup_complete();
    tracing::info!("startup complete");

    lifecycle.gate().wait();
    tracing::info!("shutdown gate released, beginning teardown");

    shutdown.trigger();
    runtime.shutdown_timeout(TEARDOWN_TIMEOUT);

    tracing::info!("shutdown complete");
    Ok(())
}
