//! Cooperative cancellation token shared between a fetch and its owner.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::Notify;

/// Clonable handle letting the holder of one clone abort work awaiting on
/// another. Cancellation is cooperative: the fetch layer races its request
/// against [`CancelToken::cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; wakes every pending waiter.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Resolve once [`cancel`](Self::cancel) has been called. Never resolves
    /// for a token that is not cancelled.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let mut notified = std::pin::pin!(self.inner.notify.notified());
            // Register the waiter before re-checking the flag; a cancel
            // landing in between must not be a lost wakeup.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(handle.await.unwrap());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_before_wait_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }

    #[tokio::test]
    async fn cancel_after_waiter_registers_still_wakes() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        // Let the waiter park on the notify before cancelling.
        tokio::task::yield_now().await;
        token.cancel();
        handle.await.unwrap();
    }
}
