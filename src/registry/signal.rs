//! One-shot broadcast signals.
//!
//! A [`Signal`] starts unfired and can be fired once; every waiter, including
//! ones that subscribe after the fact, then completes immediately. Handles
//! replace a fired signal with a fresh one so later waiters block again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Broadcast event that fires at most once.
#[derive(Clone, Debug)]
pub struct Signal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Create an unfired signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a signal that has already fired.
    pub fn fired() -> Self {
        let signal = Self::new();
        signal.fire();
        signal
    }

    /// Wake every current and future waiter.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    /// Has this signal fired?
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // the sender lives as long as `self`, so this only returns once fired
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

/// Why a [`ChangeWatch`] stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The round changed (or the caller's copy was already stale).
    Updated,
    /// The round was replaced by its successor.
    Replaced,
    /// Nothing happened before the timeout.
    TimedOut,
    /// The caller went away.
    Disconnected,
}

/// The pair of signals a long-poll waits on.
#[derive(Clone, Debug)]
pub struct ChangeWatch {
    /// Fires on the next mutation of the round.
    pub updated: Signal,
    /// Fires when the round is replaced.
    pub replaced: Signal,
}

impl ChangeWatch {
    /// Watch that resolves immediately with [`Wake::Updated`].
    pub fn stale() -> Self {
        Self { updated: Signal::fired(), replaced: Signal::new() }
    }

    /// Wait for whichever comes first: update, replacement, `timeout`, or
    /// `disconnected` resolving.
    pub async fn wait<F>(&self, timeout: Duration, disconnected: F) -> Wake
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = disconnected => Wake::Disconnected,
            _ = self.replaced.wait() => Wake::Replaced,
            _ = self.updated.wait() => Wake::Updated,
            _ = tokio::time::sleep(timeout) => Wake::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn test_fired_signal_does_not_block() {
        let signal = Signal::fired();
        assert!(signal.is_fired());
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("fired signal should not block");
    }

    #[tokio::test]
    async fn test_fire_wakes_all_waiters() {
        let signal = Signal::new();
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let s = signal.clone();
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        assert!(!signal.is_fired());
        signal.fire();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter should wake")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_stale_watch_returns_updated() {
        let watch = ChangeWatch::stale();
        let wake = watch.wait(Duration::from_secs(10), pending()).await;
        assert_eq!(wake, Wake::Updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_times_out() {
        let watch = ChangeWatch { updated: Signal::new(), replaced: Signal::new() };
        let wake = watch.wait(Duration::from_secs(15), pending()).await;
        assert_eq!(wake, Wake::TimedOut);
    }

    #[tokio::test]
    async fn test_watch_disconnect_wins() {
        let watch = ChangeWatch::stale();
        let wake = watch.wait(Duration::from_secs(10), async {}).await;
        assert_eq!(wake, Wake::Disconnected);
    }

    #[tokio::test]
    async fn test_watch_replaced() {
        let watch = ChangeWatch { updated: Signal::new(), replaced: Signal::new() };
        let replaced = watch.replaced.clone();
        let task = tokio::spawn(async move { watch.wait(Duration::from_secs(10), pending()).await });
        tokio::task::yield_now().await;
        replaced.fire();
        assert_eq!(task.await.unwrap(), Wake::Replaced);
    }
}
