use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a queued message.
///
/// This is the unit a transport carries. The payload is opaque to the transport;
/// consumers decode it with [`MessageEnvelope::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope<P> {
    message_id: Uuid,
    message_type: String,
    channel: String,
    sent_at: DateTime<Utc>,
    payload: P,
}

impl<P> MessageEnvelope<P> {
    pub fn new(channel: impl Into<String>, message_type: impl Into<String>, payload: P) -> Self {
        Self {
            message_id: Uuid::now_v7(),
            message_type: message_type.into(),
            channel: channel.into(),
            sent_at: Utc::now(),
            payload,
        }
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: DeserializeOwned> MessageEnvelope<P> {
    /// Decode a transport body into a typed envelope.
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Short, stable name for a payload type (last path segment of the Rust type).
pub(crate) fn message_type_of<P: ?Sized>() -> &'static str {
    let full = core::any::type_name::<P>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn message_type_is_short_type_name() {
        assert_eq!(message_type_of::<Ping>(), "Ping");
        assert_eq!(message_type_of::<String>(), "String");
    }

    #[test]
    fn decode_reads_back_payload_and_metadata() {
        let env = MessageEnvelope::new("pings", "Ping", Ping { n: 7 });
        let body = serde_json::to_string(&env).unwrap();

        let decoded = MessageEnvelope::<Ping>::decode(&body).unwrap();
        assert_eq!(decoded.channel(), "pings");
        assert_eq!(decoded.message_type(), "Ping");
        assert_eq!(decoded.message_id(), env.message_id());
        assert_eq!(decoded.into_payload(), Ping { n: 7 });
    }
}
