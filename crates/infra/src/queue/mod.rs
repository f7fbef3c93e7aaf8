//! Durable queue transports.
//!
//! The in-memory transport lives in `regionhub-messaging`; adapters that need
//! external infrastructure live here behind feature flags.

#[cfg(feature = "redis")]
pub mod redis_streams;

#[cfg(feature = "redis")]
pub use redis_streams::{RedisStreamsTransport, DEFAULT_STREAM_PREFIX};
