//! Shutdown coordination.
//!
//! A latched flag on a `watch` channel: once triggered it stays triggered,
//! so a task that starts waiting after the signal still sees it.

use std::sync::Arc;

use tokio::sync::watch;

/// Handle shared by whoever can stop the service and whatever must stop.
#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    /// Latch the flag and wake every waiter.
    pub fn trigger(&self) {
        if !self.flag.send_replace(true) {
            tracing::debug!("Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolve once [`Shutdown::trigger`] has been called, immediately if it
    /// already was.
    pub async fn triggered(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|&stop| stop).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
