use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::r#trait::{CacheEntryOptions, CacheError, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    absolute_deadline: Option<Instant>,
    sliding: Option<Duration>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn touch(&mut self, now: Instant) {
        if let Some(sliding) = self.sliding {
            let next = now + sliding;
            self.expires_at = Some(match self.absolute_deadline {
                Some(abs) => next.min(abs),
                None => next,
            });
        }
    }
}

/// In-memory cache for tests/dev.
///
/// Honors absolute and sliding expiration using tokio's clock, so tests can
/// drive time with `tokio::time::pause`/`advance`. Expired entries are dropped
/// when read and swept on every write.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    offline: AtomicBool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage of the cache backend.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Write a raw value with no expiry (e.g. to plant a corrupted entry).
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.into(),
                Entry {
                    value: value.into(),
                    absolute_deadline: None,
                    sliding: None,
                    expires_at: None,
                },
            );
        }
    }

    /// Raw value for `key`, ignoring expiry and without sliding it.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|e| e.value.clone()))
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("in-memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_online()?;
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))?;

        let expired = match entries.get_mut(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.touch(now);
                return Ok(Some(entry.value.clone()));
            }
        };

        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_string(&self, key: &str, value: &str, options: &CacheEntryOptions) -> Result<(), CacheError> {
        self.check_online()?;
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            absolute_deadline: options.absolute_expiration.map(|d| now + d),
            sliding: options.sliding_expiration,
            expires_at: options.initial_ttl().map(|d| now + d),
        };

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))?;
        entries.retain(|_, existing| !existing.is_expired(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}
