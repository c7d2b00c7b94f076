//! Timer that coalesces rapid calls, letting only the last one through.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::task::JoinHandle;

/// Debounce guard: each [`call`](Debouncer::call) restarts the quiet-period
/// timer, so only the final call in a burst runs its closure. Used for typed
/// search input (300 ms) and profile uniqueness checks (500 ms).
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    seq: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// A debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            seq: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Schedule `work` to run after the quiet period, superseding any call
    /// still waiting on its timer.
    pub fn call<F, Fut>(&mut self, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let seq = Arc::clone(&self.seq);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if seq.load(Ordering::Acquire) == ticket {
                work().await;
            }
        }));
    }

    /// Drop any pending call without running it. Must be invoked when the
    /// owning view unmounts so a stale timer cannot act on dead state.
    pub fn cancel(&mut self) {
        self.seq.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn only_last_call_in_burst_fires() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for value in ["z", "ze", "zel", "zeld", "zelda"] {
            let seen = Arc::clone(&seen);
            debouncer.call(move || async move {
                seen.lock().unwrap().push(value);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["zelda"]);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_fire() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for value in [1u32, 2] {
            let seen = Arc::clone(&seen);
            debouncer.call(move || async move {
                seen.lock().unwrap().push(value);
            });
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_call() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        {
            let seen = Arc::clone(&seen);
            debouncer.call(move || async move {
                seen.lock().unwrap().push(1);
            });
        }
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
