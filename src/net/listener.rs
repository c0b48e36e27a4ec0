//! TCP status listener.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Answer each connection with a one-line status (build identity, uptime)
//! - Enforce max_connections via semaphore
//! - Stop cleanly on the teardown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};

use crate::config::ListenerConfig;
use crate::version;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),
}

/// A bounded TCP listener answering status queries.
#[derive(Debug)]
pub struct StatusListener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
}

impl StatusListener {
    /// Bind to the configured address with a connection cap.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| ListenerError::Bind {
            address: config.bind_address.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address.clone(),
                source,
            })?;

        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "status listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Serve status connections until the teardown broadcast fires.
    ///
    /// The permit acquisition races the broadcast too: a listener saturated
    /// at `max_connections` still stops promptly instead of waiting for a
    /// slot to free.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>, started: Instant) {
        loop {
            let permit = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("status listener stopping");
                    break;
                }
                permit = self.connection_limit.clone().acquire_owned() => {
                    permit.expect("connection semaphore closed unexpectedly")
                }
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("status listener stopping");
                    break;
                }
                accepted = self.inner.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(peer_addr = %peer, "status connection accepted");
                            tokio::spawn(async move {
                                serve_status(stream, started).await;
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }
    }
}

async fn serve_status(mut stream: TcpStream, started: Instant) {
    let line = format!(
        "vigil {} {} {} uptime_secs={}\n",
        version::BUILD_ID,
        version::BUILD_TYPE,
        version::BUILD_OS,
        started.elapsed().as_secs()
    );

    let _ = stream.write_all(line.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use tokio::io::AsyncReadExt;

    fn test_config() -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_connections: 4,
        }
    }

    #[tokio::test]
    async fn answers_with_build_identity_line() {
        let listener = StatusListener::bind(&test_config()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let task = tokio::spawn(listener.run(shutdown.subscribe(), Instant::now()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("vigil "));
        assert!(response.contains(version::BUILD_ID));
        assert!(response.contains("uptime_secs="));

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_teardown_broadcast() {
        let listener = StatusListener::bind(&test_config()).await.unwrap();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(listener.run(shutdown.subscribe(), Instant::now()));

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_teardown_while_waiting_for_a_permit() {
        // Zero permits stands in for a listener with every slot in flight.
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_connections: 0,
        };
        let listener = StatusListener::bind(&config).await.unwrap();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(listener.run(shutdown.subscribe(), Instant::now()));

        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("saturated listener did not stop on teardown")
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_bind_address_is_a_bind_error() {
        let config = ListenerConfig {
            bind_address: "not-an-address".to_string(),
            max_connections: 1,
        };
        let err = StatusListener::bind(&config).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }
}
