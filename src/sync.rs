use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

/// One-shot shutdown flag that background tasks can sleep on.
///
/// `Notify::notify_waiters` only wakes tasks that are already registered, so
/// waiters register first and then check the flag.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    notify: Notify,
    triggered: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sleep for `timeout` unless shutdown fires first.
    ///
    /// Returns `true` once shutdown has been signaled.
    pub async fn wait_timeout_or_shutdown(&self, timeout: Duration) -> bool {
        // Register as a waiter before reading the flag so a shutdown landing
        // in between still wakes us.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_triggered() {
            return true;
        }

        tokio::select! {
            _ = notified => true,
            _ = tokio::time::sleep(timeout) => self.is_triggered(),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Set the flag and wake every waiting task
    pub fn shutdown(&self) {
        self.triggered.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}
