//! Redis-backed cache store.
//!
//! Each entry is a hash under `<prefix><key>`:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `data` | cached string |
//! | `absexp` | absolute deadline, unix millis (`-1` when unset) |
//! | `sldexp` | sliding window, millis (`-1` when unset) |
//!
//! The key's Redis TTL is the live deadline. A hit on an entry with a sliding
//! window re-arms the TTL, capped at the absolute deadline.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::r#trait::{CacheEntryOptions, CacheError, CacheStore};

const NOT_SET: i64 = -1;

/// Redis-backed cache using a multiplexed `ConnectionManager`.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection_manager: redis::aio::ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("connection_manager", &"ConnectionManager")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Unavailable(format!("failed to create redis client: {e}")))?;

        let connection_manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unavailable(format!("failed to connect to redis: {e}")))?;

        debug!(url = %redact_url(redis_url), "redis cache connected");

        Ok(Self {
            connection_manager,
            key_prefix: key_prefix.into(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError> {
        let full_key = self.full_key(key);
        let mut conn = self.connection_manager.clone();

        let (absexp, sldexp, data): (Option<i64>, Option<i64>, Option<String>) = redis::cmd("HMGET")
            .arg(&full_key)
            .arg("absexp")
            .arg("sldexp")
            .arg("data")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable(format!("redis HMGET failed: {e}")))?;

        let Some(data) = data else {
            debug!(key = key, "cache MISS");
            return Ok(None);
        };
        debug!(key = key, "cache HIT");

        if let Some(ttl) = refreshed_ttl_ms(absexp, sldexp, Utc::now().timestamp_millis()) {
            let _: i64 = redis::cmd("PEXPIRE")
                .arg(&full_key)
                .arg(ttl)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Unavailable(format!("redis PEXPIRE failed: {e}")))?;
        }

        Ok(Some(data))
    }

    async fn set_string(&self, key: &str, value: &str, options: &CacheEntryOptions) -> Result<(), CacheError> {
        let full_key = self.full_key(key);
        let mut conn = self.connection_manager.clone();
        let now_ms = Utc::now().timestamp_millis();

        let absexp = options
            .absolute_expiration
            .map(|d| now_ms.saturating_add(duration_ms(d)))
            .unwrap_or(NOT_SET);
        let sldexp = options.sliding_expiration.map(duration_ms).unwrap_or(NOT_SET);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(&full_key)
            .ignore()
            .cmd("HSET")
            .arg(&full_key)
            .arg("absexp")
            .arg(absexp)
            .arg("sldexp")
            .arg(sldexp)
            .arg("data")
            .arg(value)
            .ignore();

        match options.initial_ttl() {
            Some(ttl) => {
                pipe.cmd("PEXPIRE").arg(&full_key).arg(duration_ms(ttl).max(1)).ignore();
            }
            None => {
                pipe.cmd("PERSIST").arg(&full_key).ignore();
            }
        }

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable(format!("redis cache write failed: {e}")))?;

        debug!(key = key, absexp = absexp, sldexp = sldexp, "cache SET");
        Ok(())
    }
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// New TTL for a hit, or `None` when the entry has no sliding window.
fn refreshed_ttl_ms(absexp: Option<i64>, sldexp: Option<i64>, now_ms: i64) -> Option<i64> {
    let sliding = sldexp.filter(|s| *s != NOT_SET)?;
    let ttl = match absexp.filter(|a| *a != NOT_SET) {
        Some(abs) => sliding.min(abs.saturating_sub(now_ms)),
        None => sliding,
    };
    Some(ttl.max(1))
}

/// Redact credentials from a Redis URL for logging.
pub(crate) fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let prefix = &url[..=colon_pos];
            let suffix = &url[at_pos..];
            return format!("{}***{}", prefix, suffix);
        }
    }
    url.to_string()
}
