//! Redis Streams-backed message transport.
//!
//! Each channel maps to one stream, `<prefix><channel>`. Publishing is a single
//! `XADD` with auto-generated id; consumers read with their own consumer group
//! and are not part of this crate.
//!
//! ## Stream entry fields
//!
//! | Field | Value |
//! |-------|-------|
//! | `message_type` | short payload type name, e.g. `RegionCreateMessage` |
//! | `payload` | the JSON `MessageEnvelope` |

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use regionhub_messaging::{MessageTransport, TransportError};

/// Default stream key prefix.
pub const DEFAULT_STREAM_PREFIX: &str = "regionhub:queue:";

/// Redis Streams transport over a multiplexed `ConnectionManager`.
#[derive(Clone)]
pub struct RedisStreamsTransport {
    connection_manager: redis::aio::ConnectionManager,
    stream_prefix: String,
}

impl std::fmt::Debug for RedisStreamsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStreamsTransport")
            .field("connection_manager", &"ConnectionManager")
            .field("stream_prefix", &self.stream_prefix)
            .finish()
    }
}

/// Only the routing header is read back out of the envelope.
#[derive(Deserialize)]
struct EnvelopeHeader {
    #[serde(default)]
    message_type: String,
}

impl RedisStreamsTransport {
    pub async fn connect(redis_url: &str, stream_prefix: Option<String>) -> Result<Self, TransportError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| TransportError::Unavailable(format!("failed to create redis client: {e}")))?;
        let connection_manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| TransportError::Unavailable(format!("failed to connect to redis: {e}")))?;

        Ok(Self {
            connection_manager,
            stream_prefix: stream_prefix.unwrap_or_else(|| DEFAULT_STREAM_PREFIX.to_string()),
        })
    }

    /// Stream key backing `channel`.
    pub fn stream_key(&self, channel: &str) -> Result<String, TransportError> {
        stream_key(&self.stream_prefix, channel)
    }
}

fn stream_key(prefix: &str, channel: &str) -> Result<String, TransportError> {
    let channel = channel.trim();
    if channel.is_empty() {
        return Err(TransportError::ChannelNotFound(channel.to_string()));
    }
    Ok(format!("{prefix}{channel}"))
}

#[async_trait]
impl MessageTransport for RedisStreamsTransport {
    #[instrument(skip(self, body), fields(channel = %channel), err)]
    async fn publish(&self, channel: &str, body: String) -> Result<(), TransportError> {
        let key = self.stream_key(channel)?;
        let message_type = serde_json::from_str::<EnvelopeHeader>(&body)
            .map(|h| h.message_type)
            .unwrap_or_default();

        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("XADD")
            .arg(&key)
            .arg("*")
            .arg("message_type")
            .arg(&message_type)
            .arg("payload")
            .arg(&body)
            .query_async(&mut conn)
            .await
            .map_err(|e| TransportError::Unavailable(format!("XADD failed: {e}")))?;

        Ok(())
    }
}
