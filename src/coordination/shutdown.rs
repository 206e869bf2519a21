//! Shutdown signalling and cancellable sleeps
//!
//! Every wait in the poll loop goes through [`ShutdownHandle::sleep`], so a
//! Ctrl-C during a 17-minute intermission returns immediately instead of
//! waiting the intermission out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shutdown signal types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM / SIGINT
    Graceful,
    /// Game finished, nothing left to do
    Done,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Graceful => write!(f, "graceful"),
            ShutdownSignal::Done => write!(f, "done"),
        }
    }
}

/// Cloneable shutdown handle shared by the loop, the engine and the signal tasks
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown with specified signal type
    pub fn request_shutdown(&self, signal: ShutdownSignal) {
        if self.requested.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already requested, ignoring duplicate signal: {}", signal);
            return;
        }

        info!("Shutdown requested: {}", signal);
        let _ = self.tx.send(true);
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` when the full duration elapsed, `false` when cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_shutdown_requested() {
            return false;
        }
        let mut rx = self.rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = rx.wait_for(|requested| *requested) => false,
        }
    }
}

/// Helper to install OS signal handlers
pub fn install_signal_handlers(shutdown: ShutdownHandle) {
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C");
                on_ctrl_c.request_shutdown(ShutdownSignal::Graceful);
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("Received SIGTERM");
                    shutdown.request_shutdown(ShutdownSignal::Graceful);
                }
                Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_signal_display() {
        assert_eq!(ShutdownSignal::Graceful.to_string(), "graceful");
        assert_eq!(ShutdownSignal::Done.to_string(), "done");
    }

    #[tokio::test]
    async fn test_sleep_completes_without_shutdown() {
        let shutdown = ShutdownHandle::new();
        assert!(shutdown.sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_sleep_cancelled_by_request() {
        let shutdown = ShutdownHandle::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.request_shutdown(ShutdownSignal::Graceful);
        });

        let started = std::time::Instant::now();
        assert!(!shutdown.sleep(Duration::from_secs(3600)).await);
        assert!(started.elapsed() < Duration::from_secs(5));

        // Duplicate request should be ignored, later sleeps return at once
        shutdown.request_shutdown(ShutdownSignal::Done);
        assert!(!shutdown.sleep(Duration::from_secs(3600)).await);
    }
}
