//! Queue transport abstraction (mechanics only).
//!
//! A transport resolves a channel name to a destination and hands it a
//! serialized envelope. It makes no promise about when, or whether, a consumer
//! processes the message.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The channel name could not be resolved to a destination.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// The destination exists but the hand-off failed (connection, closed queue, ...).
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Queue transport: resolve `channel`, transmit `body`.
///
/// Returning `Ok(())` means the transport accepted the message. Implementations
/// must be cancel-safe in the sense that a dropped `publish` future never
/// reports success.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn publish(&self, channel: &str, body: String) -> Result<(), TransportError>;
}

#[async_trait]
impl<T> MessageTransport for Arc<T>
where
    T: MessageTransport + ?Sized,
{
    async fn publish(&self, channel: &str, body: String) -> Result<(), TransportError> {
        (**self).publish(channel, body).await
    }
}
