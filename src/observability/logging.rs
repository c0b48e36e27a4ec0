//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (env filter + fmt layer)
//! - Write to stderr or a reopenable log file
//! - Accept log-roll requests from the SIGHUP handler
//!
//! # Design Decisions
//! - Roll requests are a single atomic flag set from signal context; the
//!   file is actually reopened on the next log write, outside the handler.
//!   External rotation (logrotate moves the file, sends SIGHUP, the daemon
//!   reopens the path) works without any in-process scheduling
//! - `VIGIL_LOG` overrides the configured level, mirroring the usual
//!   `EnvFilter` setup

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV_VAR: &str = "VIGIL_LOG";

// Set from signal context, consumed by the sink on the next write.
static ROLL_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Request a log roll. Async-signal-safe: one atomic store.
pub fn request_log_roll() {
    ROLL_REQUESTED.store(true, Ordering::Release);
}

/// Whether a roll request is pending (not yet consumed by the sink).
pub fn roll_pending() -> bool {
    ROLL_REQUESTED.load(Ordering::Acquire)
}

/// Drop a pending roll request without rolling.
pub fn clear_roll_request() {
    ROLL_REQUESTED.store(false, Ordering::Release);
}

fn take_roll_request() -> bool {
    ROLL_REQUESTED.swap(false, Ordering::AcqRel)
}

// Serializes tests that touch the process-global roll flag.
#[cfg(test)]
pub(crate) static ROLL_TEST_LOCK: Mutex<()> = Mutex::new(());

struct SinkInner {
    path: PathBuf,
    file: Mutex<File>,
}

/// A log sink over a reopenable file.
///
/// Each write first checks the roll flag; when set, the path is reopened
/// (append/create) before writing. Reopen failure keeps the old handle so
/// logging never goes dark mid-incident.
#[derive(Clone)]
pub struct RollSink {
    inner: Arc<SinkInner>,
}

impl RollSink {
    /// Open (append/create) the log file at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_log_file(path)?;
        Ok(Self {
            inner: Arc::new(SinkInner {
                path: path.to_path_buf(),
                file: Mutex::new(file),
            }),
        })
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writer handed to the fmt layer, one per log event.
pub struct SinkWriter {
    inner: Arc<SinkInner>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .inner
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if take_roll_request() {
            // On reopen failure keep the old handle; the next SIGHUP retries.
            if let Ok(reopened) = open_log_file(&self.inner.path) {
                *file = reopened;
            }
        }

        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .flush()
    }
}

impl<'a> MakeWriter<'a> for RollSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Initialize the tracing subscriber from config.
///
/// File output when `logging.file` is set, stderr otherwise. Called once by
/// main; a second call would panic inside `init`, which is the desired
/// loud failure for a wiring bug.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.file {
        Some(path) => {
            let sink = RollSink::open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(sink)
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }

    Ok(())
}
