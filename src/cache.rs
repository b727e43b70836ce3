//! Time-boxed memoization of feed results.
//!
//! [`ResultCache`] keeps at most one live [`FeedResult`] per [`FeedKey`].
//! Each key has its own async mutex, held across the refresh, so two callers
//! racing on an expired key trigger a single fetch: the second waits and then
//! finds the fresh entry. Different keys never block each other.
//!
//! Failed refreshes are not cached. The caller receives an empty, stale
//! result and the next call for that key fetches again.

use crate::error::FetchError;
use crate::models::{FeedKey, FeedResult};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        self.as_ref().now()
    }
}

#[derive(Debug)]
struct CacheEntry {
    result: Arc<FeedResult>,
    stored_at: DateTime<Utc>,
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

#[derive(Debug)]
pub struct ResultCache<C = SystemClock> {
    clock: C,
    slots: Mutex<HashMap<FeedKey, Slot>>,
}

impl Default for ResultCache<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn slot(&self, key: &FeedKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Return the cached result for `key` if it is younger than `ttl`,
    /// otherwise run `refresh` and cache its result.
    ///
    /// A failed refresh yields [`FeedResult::failed`] and leaves the key empty.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &FeedKey,
        ttl: TimeDelta,
        refresh: F,
    ) -> Arc<FeedResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FeedResult, FetchError>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            let age = self.clock.now() - cached.stored_at;
            if age < ttl {
                debug!(%key, age_secs = age.num_seconds(), "Cache hit");
                return Arc::clone(&cached.result);
            }
            debug!(%key, age_secs = age.num_seconds(), "Cache entry expired");
        } else {
            debug!(%key, "Cache miss");
        }

        match refresh().await {
            Ok(result) => {
                let result = Arc::new(result);
                *entry = Some(CacheEntry {
                    result: Arc::clone(&result),
                    stored_at: self.clock.now(),
                });
                result
            }
            Err(e) => {
                warn!(%key, error = %e, "Refresh failed; returning stale empty result");
                *entry = None;
                Arc::new(FeedResult::failed(key, self.clock.now(), e.to_string()))
            }
        }
    }

    /// Drop every cached result; the next call per key fetches again.
    pub fn invalidate_all(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let count = slots.len();
        slots.clear();
        info!(count, "Invalidated cached feed results");
    }

    /// Number of keys currently holding a result.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| slot.try_lock().map(|e| e.is_some()).unwrap_or(true))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use crate::models::FeedDiagnostics;
    use chrono::TimeZone;
    use std::future::{ready, Ready};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A clock that only moves when told to.
    #[derive(Debug)]
    pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self(Mutex::new(Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap()))
        }

        pub(crate) fn advance(&self, by: TimeDelta) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn result_for(key: &FeedKey, at: DateTime<Utc>) -> FeedResult {
        FeedResult {
            site_id: key.site.clone(),
            feed_id: key.feed.clone(),
            items: Vec::new(),
            fetched_at: at,
            stale: false,
            error: None,
            diagnostics: FeedDiagnostics::default(),
        }
    }

    fn counted(
        calls: &AtomicUsize,
        key: &FeedKey,
        at: DateTime<Utc>,
    ) -> Ready<Result<FeedResult, FetchError>> {
        calls.fetch_add(1, Ordering::SeqCst);
        ready(Ok(result_for(key, at)))
    }

    #[tokio::test]
    async fn test_hit_within_ttl_reuses_result() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::new(Arc::clone(&clock));
        let key = FeedKey::new("tempo", "trending-articles");
        let calls = AtomicUsize::new(0);
        let ttl = TimeDelta::minutes(5);

        let first = cache
            .get_or_fetch(&key, ttl, || counted(&calls, &key, clock.now()))
            .await;
        clock.advance(TimeDelta::minutes(4));
        let second = cache
            .get_or_fetch(&key, ttl, || counted(&calls, &key, clock.now()))
            .await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!second.stale);
    }

    #[tokio::test]
    async fn test_expiry_triggers_exactly_one_refetch() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::new(Arc::clone(&clock));
        let key = FeedKey::new("tempo", "trending-topics");
        let calls = AtomicUsize::new(0);
        let ttl = TimeDelta::minutes(5);
        let refresh = || counted(&calls, &key, clock.now());

        let first = cache.get_or_fetch(&key, ttl, refresh).await;
        clock.advance(TimeDelta::minutes(5));
        let second = cache.get_or_fetch(&key, ttl, refresh).await;
        let third = cache.get_or_fetch(&key, ttl, refresh).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert!(second.fetched_at > first.fetched_at);
    }

    #[tokio::test]
    async fn test_failure_is_stale_and_not_cached() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::new(Arc::clone(&clock));
        let key = FeedKey::new("kompas", "popular-articles");
        let calls = AtomicUsize::new(0);
        let ttl = TimeDelta::minutes(5);

        cache
            .get_or_fetch(&key, ttl, || counted(&calls, &key, clock.now()))
            .await;
        clock.advance(TimeDelta::minutes(6));

        let failed = cache
            .get_or_fetch(&key, ttl, || {
                ready(Err::<FeedResult, _>(FetchError::new(
                    FetchErrorKind::Timeout,
                    "timed out",
                )))
            })
            .await;
        assert!(failed.stale);
        assert!(failed.items.is_empty());
        assert_eq!(failed.error.as_deref(), Some("timeout: timed out"));
        assert!(cache.is_empty());

        let recovered = cache
            .get_or_fetch(&key, ttl, || counted(&calls, &key, clock.now()))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!recovered.stale);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_refetch() {
        let cache = ResultCache::new(ManualClock::new());
        let a = FeedKey::new("tempo", "trending-articles");
        let b = FeedKey::new("kompas", "popular-articles");
        let calls = AtomicUsize::new(0);
        let ttl = TimeDelta::minutes(5);

        for key in [&a, &b, &a, &b] {
            cache
                .get_or_fetch(key, ttl, || counted(&calls, key, cache.now()))
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());

        cache
            .get_or_fetch(&a, ttl, || counted(&calls, &a, cache.now()))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let cache = ResultCache::new(ManualClock::new());
        let key = FeedKey::new("tempo", "trending-articles");
        let calls = AtomicUsize::new(0);
        let ttl = TimeDelta::minutes(5);

        let (calls_ref, key_ref, cache_ref) = (&calls, &key, &cache);
        let refresh = move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, FetchError>(result_for(key_ref, cache_ref.now()))
        };

        let (first, second) = tokio::join!(
            cache.get_or_fetch(&key, ttl, refresh),
            cache.get_or_fetch(&key, ttl, refresh)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
