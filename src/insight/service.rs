//! Cached, non-blocking insight refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::{summarize_or_placeholder, Summarizer};
use crate::data::WindowStats;

/// How long a computed insight stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Text shown before the first insight has been computed.
pub const NO_INSIGHTS: &str = "No insights yet.";

/// A computed insight and when it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightCache {
    pub computed_at: DateTime<Utc>,
    pub value: String,
}

impl InsightCache {
    pub fn new(computed_at: DateTime<Utc>, value: String) -> Self {
        Self { computed_at, value }
    }

    /// Whether `ttl` has elapsed since the insight was computed.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.computed_at).to_std() {
            Ok(age) => age >= ttl,
            // computed_at is in the future: clock went backwards
            Err(_) => false,
        }
    }
}

/// Keeps the current insight and recomputes it in the background when stale.
#[derive(Debug)]
pub struct InsightService {
    backend: Arc<dyn Summarizer>,
    runtime: Handle,
    ttl: Duration,
    cache: Option<InsightCache>,
    pending: Option<oneshot::Receiver<String>>,
    force_next: bool,
}

impl InsightService {
    pub fn new(backend: Arc<dyn Summarizer>, ttl: Duration, runtime: Handle) -> Self {
        Self {
            backend,
            runtime,
            ttl,
            cache: None,
            pending: None,
            force_next: false,
        }
    }

    /// Current insight text, or [`NO_INSIGHTS`] before the first result.
    pub fn text(&self) -> &str {
        self.cache.as_ref().map_or(NO_INSIGHTS, |c| c.value.as_str())
    }

    pub fn cache(&self) -> Option<&InsightCache> {
        self.cache.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a computation is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// Force a recomputation on the next [`poll`](Self::poll), keeping the
    /// current text on screen until it lands.
    pub fn invalidate(&mut self) {
        self.force_next = true;
    }

    /// Whether the next poll would start a computation.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.force_next || self.cache.as_ref().is_none_or(|c| c.is_stale(now, self.ttl))
    }

    /// Collect a finished computation and start a new one if the cache is stale.
    ///
    /// `stats` is only evaluated when a computation starts. Returns `true`
    /// when the displayed text changed.
    pub fn poll(&mut self, now: DateTime<Utc>, stats: impl FnOnce() -> WindowStats) -> bool {
        if let Some(rx) = self.pending.as_mut() {
            match rx.try_recv() {
                Ok(value) => {
                    self.pending = None;
                    tracing::debug!(backend = self.backend.name(), "insight refreshed");
                    self.cache = Some(InsightCache::new(now, value));
                    return true;
                }
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    // task was cancelled or panicked; retry on the next stale check
                    self.pending = None;
                    tracing::warn!(
                        backend = self.backend.name(),
                        "insight task ended without a result"
                    );
                }
            }
        }

        if self.needs_refresh(now) {
            self.force_next = false;
            let stats = stats();
            let backend = self.backend.clone();
            let (tx, rx) = oneshot::channel();
            self.runtime.spawn(async move {
                let text = summarize_or_placeholder(backend.as_ref(), &stats).await;
                let _ = tx.send(text);
            });
            self.pending = Some(rx);
        }
        false
    }

    /// Compute an insight inline and store it, bypassing the background task.
    pub async fn refresh_now(&mut self, now: DateTime<Utc>, stats: &WindowStats) -> &str {
        self.pending = None;
        self.force_next = false;
        let value = summarize_or_placeholder(self.backend.as_ref(), stats).await;
        self.cache = Some(InsightCache::new(now, value));
        self.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::{InsightError, RuleSummarizer};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for Counting {
        async fn summarize(&self, stats: &WindowStats) -> Result<String, InsightError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("call {} over {} rows", n, stats.rows))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    async fn settle(service: &mut InsightService, now: DateTime<Utc>) -> bool {
        for _ in 0..100 {
            if service.poll(now, WindowStats::default) {
                return true;
            }
            tokio::task::yield_now().await;
        }
        false
    }

    #[test]
    fn cache_goes_stale_after_ttl() {
        let cache = InsightCache::new(at(0), "x".to_string());
        let ttl = Duration::from_secs(300);
        assert!(!cache.is_stale(at(0), ttl));
        assert!(!cache.is_stale(at(299), ttl));
        assert!(cache.is_stale(at(300), ttl));
        assert!(!cache.is_stale(at(-10), ttl));
    }

    #[tokio::test]
    async fn first_poll_computes_and_ttl_keeps_it() {
        let backend = Arc::new(Counting::default());
        let mut service = InsightService::new(backend.clone(), DEFAULT_TTL, Handle::current());
        assert_eq!(service.text(), NO_INSIGHTS);

        service.poll(at(0), WindowStats::default);
        assert!(service.is_refreshing());
        assert!(settle(&mut service, at(1)).await);
        assert_eq!(service.text(), "call 1 over 0 rows");

        // still fresh: no new computation
        assert!(!service.poll(at(100), || panic!("stats evaluated while fresh")));
        assert!(!service.is_refreshing());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // stale: recompute
        service.poll(at(400), WindowStats::default);
        assert!(settle(&mut service, at(401)).await);
        assert_eq!(service.text(), "call 2 over 0 rows");
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let backend = Arc::new(Counting::default());
        let mut service = InsightService::new(backend.clone(), DEFAULT_TTL, Handle::current());
        service.poll(at(0), WindowStats::default);
        settle(&mut service, at(0)).await;

        service.invalidate();
        assert!(service.needs_refresh(at(1)));
        service.poll(at(1), WindowStats::default);
        // old text stays visible while the new one is computed
        assert_eq!(service.text(), "call 1 over 0 rows");
        assert!(settle(&mut service, at(2)).await);
        assert_eq!(service.text(), "call 2 over 0 rows");
    }

    #[tokio::test]
    async fn refresh_now_replaces_text() {
        let mut service =
            InsightService::new(Arc::new(RuleSummarizer), DEFAULT_TTL, Handle::current());
        let text = service.refresh_now(at(0), &WindowStats::default()).await.to_string();
        assert!(text.contains("No readings"));
        assert_eq!(service.cache().unwrap().computed_at, at(0));
        assert!(!service.needs_refresh(at(10)));
    }
}
