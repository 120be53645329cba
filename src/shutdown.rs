//! Graceful shutdown signalling
//!
//! A [`ShutdownHandle`] is created once at startup and passed explicitly to
//! every long-running workflow. Crawl loops check it before each retry
//! attempt and at each politeness pause, so a Ctrl-C ends the run after the
//! in-flight request completes rather than mid-stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared shutdown flag with wakeup notification.
#[derive(Debug, Default)]
pub struct ShutdownHandle {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    /// Creates a new handle wrapped in [`Arc`] for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Requests shutdown. Waiters are notified exactly once.
    pub fn request(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Waits until shutdown is requested. Returns immediately if already set.
    pub async fn wait(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Spawns a task that trips the handle on Ctrl-C.
pub fn listen_for_ctrl_c(handle: Arc<ShutdownHandle>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current request before stopping");
            handle.request();
        }
    });
}
