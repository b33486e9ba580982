//! Keystroke debouncing for live search.
//!
//! Every keystroke registers a new generation for its session key and then
//! waits for the idle delay. Only the request still holding the latest
//! generation when its delay expires is allowed through; anything superseded
//! resolves to `None` without touching the backend. This is a debounce, not a
//! throttle: each keystroke restarts the wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

/// Idle time before a live search is sent.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// How long an idle session keeps its slot.
const SLOT_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

/// Per-session search debouncer.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SearchDebouncer {
    inner: Arc<DebouncerInner>,
}

struct DebouncerInner {
    delay: Duration,
    next_generation: AtomicU64,
    latest: Cache<String, u64>,
}

impl SearchDebouncer {
    /// Create a debouncer with the given idle delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let latest = Cache::builder()
            .max_capacity(100_000)
            .time_to_idle(SLOT_IDLE_TTL)
            .build();

        Self {
            inner: Arc::new(DebouncerInner {
                delay,
                next_generation: AtomicU64::new(1),
                latest,
            }),
        }
    }

    /// The configured idle delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Register a keystroke for `key` and wait out the idle delay.
    ///
    /// Returns `Some(text)` if no newer keystroke arrived for the same key in
    /// the meantime, `None` if this one was superseded.
    pub async fn settle(&self, key: &str, text: String) -> Option<String> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        self.register(key, generation).await;

        tokio::time::sleep(self.inner.delay).await;

        if self.claim(key, generation).await {
            Some(text)
        } else {
            tracing::debug!(key, generation, "Search keystroke superseded");
            None
        }
    }

    /// Record `generation` as the latest for `key` unless a newer one is
    /// already there.
    async fn register(&self, key: &str, generation: u64) {
        self.inner
            .latest
            .entry(key.to_owned())
            .and_compute_with(|current| {
                let newer = current.is_some_and(|entry| *entry.value() > generation);
                std::future::ready(if newer { Op::Nop } else { Op::Put(generation) })
            })
            .await;
    }

    /// Clear the slot if it still holds `generation`; true if it did.
    async fn claim(&self, key: &str, generation: u64) -> bool {
        let result = self
            .inner
            .latest
            .entry(key.to_owned())
            .and_compute_with(|current| {
                let latest = current.is_some_and(|entry| *entry.value() == generation);
                std::future::ready(if latest { Op::Remove } else { Op::Nop })
            })
            .await;

        matches!(result, CompResult::Removed(_))
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_single_keystroke_passes_after_delay() {
        let debouncer = SearchDebouncer::default();
        let started = tokio::time::Instant::now();

        let settled = debouncer.settle("session-a", "shoes".to_string()).await;

        assert_eq!(settled.as_deref(), Some("shoes"));
        assert!(started.elapsed() >= DEFAULT_SEARCH_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_final_text() {
        let debouncer = SearchDebouncer::default();

        let first = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("session-a", "sh".to_string()).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("session-a", "shoes".to_string()).await }
        });

        assert_eq!(first.await.ok().flatten(), None);
        assert_eq!(second.await.ok().flatten().as_deref(), Some("shoes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_after_delay_both_pass() {
        let debouncer = SearchDebouncer::default();

        let first = debouncer.settle("session-a", "sh".to_string()).await;
        let second = debouncer.settle("session-a", "shoes".to_string()).await;

        assert_eq!(first.as_deref(), Some("sh"));
        assert_eq!(second.as_deref(), Some("shoes"));
    }

    #[tokio::test]
    async fn test_older_keystroke_registered_late_does_not_win() {
        let debouncer = SearchDebouncer::default();

        debouncer.register("session-a", 6).await;
        debouncer.register("session-a", 5).await;

        assert!(!debouncer.claim("session-a", 5).await);
        assert!(debouncer.claim("session-a", 6).await);
    }

    #[tokio::test]
    async fn test_claim_leaves_newer_keystroke_in_place() {
        let debouncer = SearchDebouncer::default();

        debouncer.register("session-a", 5).await;
        debouncer.register("session-a", 6).await;

        assert!(!debouncer.claim("session-a", 5).await);
        assert!(debouncer.claim("session-a", 6).await);
        assert!(!debouncer.claim("session-a", 6).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_independent() {
        let debouncer = SearchDebouncer::default();

        let a = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("session-a", "ball".to_string()).await }
        });
        let b = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("session-b", "phone".to_string()).await }
        });

        assert_eq!(a.await.ok().flatten().as_deref(), Some("ball"));
        assert_eq!(b.await.ok().flatten().as_deref(), Some("phone"));
    }
}
