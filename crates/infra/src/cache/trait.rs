use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Default absolute lifetime of a cache entry.
pub const DEFAULT_ABSOLUTE_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// Cache operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache backend could not be reached or rejected the command.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized for storage.
    #[error("cache serialization failed: {0}")]
    Serialization(String),

    /// A cached value exists but cannot be decoded.
    #[error("corrupted cache entry '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

/// Expiration policy for a cache write.
///
/// - `absolute_expiration`: entry dies this long after the write, no matter what
/// - `sliding_expiration`: entry dies after this long without a read; each hit
///   pushes the deadline out again (never past the absolute deadline)
///
/// Both `None` means the entry never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntryOptions {
    pub absolute_expiration: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
}

impl CacheEntryOptions {
    pub fn new(absolute_expiration: Option<Duration>, sliding_expiration: Option<Duration>) -> Self {
        Self {
            absolute_expiration,
            sliding_expiration,
        }
    }

    pub fn never_expire() -> Self {
        Self::new(None, None)
    }

    pub fn absolute(ttl: Duration) -> Self {
        Self::new(Some(ttl), None)
    }

    pub fn sliding(ttl: Duration) -> Self {
        Self::new(None, Some(ttl))
    }

    /// Time-to-live right after a write: the tighter of the two windows.
    pub fn initial_ttl(&self) -> Option<Duration> {
        match (self.absolute_expiration, self.sliding_expiration) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (Some(a), None) => Some(a),
            (None, Some(s)) => Some(s),
            (None, None) => None,
        }
    }
}

impl Default for CacheEntryOptions {
    fn default() -> Self {
        Self::absolute(DEFAULT_ABSOLUTE_EXPIRATION)
    }
}

/// String cache with per-entry expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a live entry. Expired entries read as `None`.
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write (or overwrite) an entry.
    async fn set_string(&self, key: &str, value: &str, options: &CacheEntryOptions) -> Result<(), CacheError>;
}

#[async_trait]
impl<C> CacheStore for Arc<C>
where
    C: CacheStore + ?Sized,
{
    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get_string(key).await
    }

    async fn set_string(&self, key: &str, value: &str, options: &CacheEntryOptions) -> Result<(), CacheError> {
        (**self).set_string(key, value, options).await
    }
}
