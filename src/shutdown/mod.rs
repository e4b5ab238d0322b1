// Package shutdown provides graceful shutdown functionality.

use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Graceful shutdown handler: turns an OS signal into a cancelled token and
/// bounds the time the remaining cleanup may take.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Duration,
}

impl GracefulShutdown {
    /// Creates a new graceful shutdown handler
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            shutdown_token,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the graceful shutdown timeout
    pub fn with_graceful_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Waits for SIGINT or for the token to be cancelled elsewhere, then cancels the token.
    pub async fn await_signal(&self) {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }
        self.shutdown_token.cancel();
    }

    /// Runs the cleanup future, giving up once the graceful timeout elapses.
    pub async fn finish<F>(&self, cleanup: F) -> Result<F::Output, TimeoutError>
    where
        F: Future,
    {
        match timeout(self.timeout, cleanup).await {
            Ok(output) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(output)
            }
            Err(_) => {
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = self.timeout.as_secs(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_await_signal_returns_on_cancel() {
        let token = CancellationToken::new();
        let shutdown = GracefulShutdown::new(token.clone());
        token.cancel();
        shutdown.await_signal().await;
        assert!(shutdown.token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_times_out() {
        let shutdown = GracefulShutdown::new(CancellationToken::new())
            .with_graceful_timeout(Duration::from_millis(10));
        let result = shutdown.finish(std::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_finish_passes_output_through() {
        let shutdown = GracefulShutdown::new(CancellationToken::new());
        assert_eq!(shutdown.finish(async { 7 }).await.unwrap(), 7);
    }
}
