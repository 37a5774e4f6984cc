//! Per-key coalescing of bursty events.
//!
//! Every key gets a relay holding at most one pending value; a newer value
//! replaces the pending one instead of queueing behind it. Each relay forwards
//! at most one value per window, always the latest it has seen, so events of
//! one key keep their order while different keys never delay each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::{
    mpsc,
    watch,
};
use tokio::task::JoinSet;

/// Lazily created relays keyed by `K`, forwarding coalesced `V`s.
///
/// Only the owner pushes (`&mut self`), so the relay map needs no lock.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    /// Quiet period of each relay.
    window: Duration,
    /// One relay per key seen so far.
    relays: HashMap<K, watch::Sender<V>>,
    /// Where relays forward to.
    out: mpsc::UnboundedSender<V>,
    /// Relay tasks, joined on close.
    tasks: JoinSet<()>,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a debouncer and the receiver of its coalesced values.
    #[must_use]
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<V>) {
        let (out, rx) = mpsc::unbounded_channel();
        (Self { window, relays: HashMap::new(), out, tasks: JoinSet::new() }, rx)
    }

    /// Admits `value` for `key`, overwriting a value still pending for that key.
    pub fn push(&mut self, key: K, value: V) {
        if let Some(relay) = self.relays.get(&key) {
            relay.send_replace(value);
            return;
        }

        let (relay, rx) = watch::channel(value);
        self.tasks.spawn(run_relay(rx, self.out.clone(), self.window));
        self.relays.insert(key, relay);
    }

    /// Number of keys seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Whether no key has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Closes every relay and waits until each has forwarded its pending value.
    ///
    /// The coalesced receiver ends once this returns.
    pub async fn close(self) {
        let Self { relays, out, mut tasks, .. } = self;
        drop(relays);
        drop(out);
        while let Some(joined) = tasks.join_next().await {
            if let Err(error) = joined {
                tracing::debug!(%error, "Debounce relay ended abnormally");
            }
        }
    }
}

/// Forwards the latest value of `rx` at most once per `window`.
///
/// The initial value of a fresh channel counts as pending.
async fn run_relay<V: Clone>(
    mut rx: watch::Receiver<V>,
    out: mpsc::UnboundedSender<V>,
    window: Duration,
) {
    loop {
        tokio::time::sleep(window).await;
        let value = rx.borrow_and_update().clone();
        if out.send(value).is_err() {
            return;
        }
        // Still yields an unseen value after the sender is gone.
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use tokio_test::{
        assert_pending,
        assert_ready_eq,
        task,
    };

    use super::*;

    const WINDOW: Duration = Duration::from_secs(1);

    /// `push`: a burst yields only its latest value
    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_to_latest() {
        let (mut debouncer, mut rx) = Debouncer::new(WINDOW);

        for n in 1..=5 {
            debouncer.push("admin.yaml", n);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(WINDOW).await;

        assert_eq!(rx.recv().await, Some(5));
        assert!(rx.try_recv().is_err());
    }

    /// `push`: values wait for the window
    #[tokio::test(start_paused = true)]
    async fn test_nothing_is_forwarded_before_the_window_ends() {
        let (mut debouncer, rx) = Debouncer::new(WINDOW);
        let mut rx = task::spawn(recv_one(rx));

        debouncer.push("a", 1);
        assert_pending!(rx.poll());

        tokio::time::sleep(WINDOW / 2).await;
        assert_pending!(rx.poll());

        tokio::time::sleep(WINDOW).await;
        assert_ready_eq!(rx.poll(), Some(1));
    }

    async fn recv_one(mut rx: mpsc::UnboundedReceiver<i32>) -> Option<i32> {
        rx.recv().await
    }

    /// `push`: keys do not delay each other and keep their order
    #[googletest::test]
    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent_and_ordered() {
        let (mut debouncer, mut rx) = Debouncer::new(WINDOW);

        debouncer.push("a", "a1");
        debouncer.push("b", "b1");
        tokio::time::sleep(WINDOW * 2).await;
        debouncer.push("a", "a2");
        tokio::time::sleep(WINDOW * 2).await;

        let mut seen = Vec::new();
        while let Ok(value) = rx.try_recv() {
            seen.push(value);
        }
        let a_values: Vec<_> = seen.iter().filter(|v| v.starts_with('a')).copied().collect();
        expect_that!(seen, len(eq(3)));
        assert_eq!(a_values, vec!["a1", "a2"]);
        expect_that!(debouncer.len(), eq(2));
    }

    /// `close`: pending values are flushed before the stream ends
    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_values_and_ends_stream() {
        let (mut debouncer, mut rx) = Debouncer::new(WINDOW);

        debouncer.push("a", 1);
        debouncer.push("b", 2);
        debouncer.close().await;

        let mut seen = Vec::new();
        while let Some(value) = rx.recv().await {
            seen.push(value);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    /// `close`: returns at once when nothing is pending
    #[tokio::test(start_paused = true)]
    async fn test_close_without_pending_values_returns_promptly() {
        let (mut debouncer, mut rx) = Debouncer::new(WINDOW);
        debouncer.push("a", 1);
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(rx.recv().await, Some(1));

        debouncer.close().await;

        assert_eq!(rx.recv().await, None);
    }
}
