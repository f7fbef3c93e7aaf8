//! Key/value cache holding serialized snapshots with expiration.
//!
//! The cache is owned by no one: entries expire or get overwritten, and
//! nothing invalidates them on writes to the store.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod r#trait;

pub use in_memory::InMemoryCacheStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCacheStore;
pub use r#trait::{CacheEntryOptions, CacheError, CacheStore};
