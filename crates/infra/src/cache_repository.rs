//! Cache-aside reads over a `CacheStore`.
//!
//! ```text
//! get_or_compute(key)
//!   ├─ cache hit  ─▶ deserialize ─▶ return (compute never runs)
//!   └─ cache miss ─▶ compute() ─▶ Some(v) ─▶ write back ─▶ return v
//!                               └ None    ─▶ return None (not cached)
//! ```
//!
//! There is no single-flight: concurrent misses for one key all compute, and
//! the last write wins. Entries are never invalidated, only expired.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::{CacheEntryOptions, CacheError, CacheStore};

/// Cache-aside wrapper: one cache, one expiration policy.
#[derive(Debug, Clone)]
pub struct CacheAsideRepository<C> {
    cache: C,
    options: CacheEntryOptions,
}

impl<C> CacheAsideRepository<C> {
    pub fn new(cache: C) -> Self {
        Self::with_options(cache, CacheEntryOptions::default())
    }

    pub fn with_options(cache: C, options: CacheEntryOptions) -> Self {
        Self { cache, options }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn options(&self) -> &CacheEntryOptions {
        &self.options
    }
}

impl<C> CacheAsideRepository<C>
where
    C: CacheStore,
{
    /// Read `key` from the cache, falling back to `compute` on a miss.
    ///
    /// A hit that cannot be decoded is reported as `CacheError::Corrupted`
    /// rather than silently recomputed.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(raw) = self.cache.get_string(key).await? {
            let value = serde_json::from_str(&raw).map_err(|e| CacheError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Some(value));
        }

        let Some(value) = compute().await? else {
            debug!(key = key, "nothing to cache");
            return Ok(None);
        };

        let raw = serde_json::to_string(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache.set_string(key, &raw, &self.options).await?;

        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;
    use crate::cache::InMemoryCacheStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        name: String,
    }

    fn snapshot(name: &str) -> Snapshot {
        Snapshot { name: name.to_string() }
    }

    async fn counted(
        repo: &CacheAsideRepository<Arc<InMemoryCacheStore>>,
        calls: &AtomicUsize,
        value: Option<Snapshot>,
    ) -> Result<Option<Snapshot>, CacheError> {
        repo.get_or_compute("k", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        })
        .await
    }

    #[tokio::test]
    async fn miss_computes_and_populates_then_hit_skips_compute() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let repo = CacheAsideRepository::new(cache.clone());
        let calls = AtomicUsize::new(0);

        let first = counted(&repo, &calls, Some(snapshot("SP"))).await.unwrap();
        let second = counted(&repo, &calls, Some(snapshot("changed"))).await.unwrap();

        assert_eq!(first, Some(snapshot("SP")));
        assert_eq!(second, Some(snapshot("SP")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.peek("k").as_deref(), Some(r#"{"name":"SP"}"#));
    }

    #[tokio::test]
    async fn absent_values_are_not_cached() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let repo = CacheAsideRepository::new(cache.clone());
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&repo, &calls, None).await.unwrap(), None);
        assert_eq!(counted(&repo, &calls, None).await.unwrap(), None);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek("k"), None);
    }

    #[tokio::test]
    async fn corrupted_entry_is_reported_without_computing() {
        let cache = Arc::new(InMemoryCacheStore::new());
        cache.insert_raw("k", "{not json");
        let repo = CacheAsideRepository::new(cache);
        let calls = AtomicUsize::new(0);

        let err = counted(&repo, &calls, Some(snapshot("SP"))).await.unwrap_err();

        assert!(matches!(err, CacheError::Corrupted { ref key, .. } if key == "k"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn compute_errors_propagate_and_nothing_is_cached() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let repo = CacheAsideRepository::new(cache.clone());

        let err = repo
            .get_or_compute::<Snapshot, _, _, _>("k", || async {
                Err(CacheError::Unavailable("store down".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(err, CacheError::Unavailable("store down".to_string()));
        assert_eq!(cache.peek("k"), None);
    }

    #[tokio::test]
    async fn cache_outage_fails_the_read() {
        let cache = Arc::new(InMemoryCacheStore::new());
        cache.set_offline(true);
        let repo = CacheAsideRepository::new(cache);
        let calls = AtomicUsize::new(0);

        let err = counted(&repo, &calls, Some(snapshot("SP"))).await.unwrap_err();
        assert!(matches!(err, CacheError::Unavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let repo = CacheAsideRepository::with_options(
            cache,
            CacheEntryOptions::absolute(Duration::from_secs(30)),
        );
        let calls = AtomicUsize::new(0);

        counted(&repo, &calls, Some(snapshot("v1"))).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        let refreshed = counted(&repo, &calls, Some(snapshot("v2"))).await.unwrap();

        assert_eq!(refreshed, Some(snapshot("v2")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
