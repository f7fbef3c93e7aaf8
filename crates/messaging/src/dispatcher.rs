//! Fire-and-forget message dispatch.
//!
//! `Dispatcher::try_send` keeps failures tagged (`DispatchError`) so callers and
//! logs can tell them apart; `Dispatcher::send` flattens the outcome to a `bool`
//! for call sites that only need "handed off or not".
//!
//! ```text
//! payload ─▶ empty? ─▶ serialize ─▶ envelope ─▶ transport.publish(channel)
//!              │           │                          │
//!              ▼           ▼                          ▼
//!         EmptyPayload  Serialization      ChannelNotFound / Transport
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::envelope::{message_type_of, MessageEnvelope};
use crate::transport::{MessageTransport, TransportError};

/// Why a message was not handed to the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Nothing to send (absent payload, or one that serializes to `null`).
    #[error("payload is empty")]
    EmptyPayload,

    /// The channel could not be resolved.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// The payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport refused or failed the hand-off.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<TransportError> for DispatchError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::ChannelNotFound(channel) => DispatchError::ChannelNotFound(channel),
            TransportError::Unavailable(msg) => DispatchError::Transport(msg),
        }
    }
}

/// Sends typed payloads to named channels over a `MessageTransport`.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    transport: T,
}

impl<T> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T> Dispatcher<T>
where
    T: MessageTransport,
{
    /// Send `payload` to `channel`, returning the message id on hand-off.
    ///
    /// An absent payload short-circuits before the transport is touched.
    #[instrument(skip(self, payload), fields(channel = %channel), err)]
    pub async fn try_send<P>(&self, channel: &str, payload: Option<&P>) -> Result<Uuid, DispatchError>
    where
        P: Serialize + Sync,
    {
        let payload = payload.ok_or(DispatchError::EmptyPayload)?;

        let value = serde_json::to_value(payload)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
        if value.is_null() {
            return Err(DispatchError::EmptyPayload);
        }

        let envelope = MessageEnvelope::new(channel, message_type_of::<P>(), value);
        let message_id = envelope.message_id();
        let body = serde_json::to_string(&envelope)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        self.transport.publish(channel, body).await?;

        debug!(%message_id, message_type = envelope.message_type(), "message handed to transport");
        Ok(message_id)
    }

    /// Best-effort send: `true` iff the transport accepted the message.
    ///
    /// Never errors; the distinct failure is logged and collapsed to `false`.
    pub async fn send<P>(&self, channel: &str, payload: Option<&P>) -> bool
    where
        P: Serialize + Sync,
    {
        match self.try_send(channel, payload).await {
            Ok(_) => true,
            Err(err) => {
                warn!(channel = %channel, error = %err, "message dispatch failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::in_memory::InMemoryTransport;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CreateThing {
        code: String,
    }

    /// Records calls; optionally fails every publish.
    #[derive(Default)]
    struct RecordingTransport {
        calls: AtomicUsize,
        bodies: Mutex<Vec<(String, String)>>,
        fail_with: Option<TransportError>,
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn publish(&self, channel: &str, body: String) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.bodies.lock().unwrap().push((channel.to_string(), body));
            Ok(())
        }
    }

    #[tokio::test]
    async fn absent_payload_returns_false_without_touching_transport() {
        let dispatcher = Dispatcher::new(RecordingTransport::default());

        let sent = dispatcher.send::<CreateThing>("test-queue", None).await;

        assert!(!sent);
        assert_eq!(dispatcher.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn null_payload_is_empty() {
        let dispatcher = Dispatcher::new(RecordingTransport::default());
        let nothing: Option<String> = None;

        let err = dispatcher.try_send("test-queue", Some(&nothing)).await.unwrap_err();

        assert_eq!(err, DispatchError::EmptyPayload);
        assert_eq!(dispatcher.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_payload_is_wrapped_and_sent_once() {
        let dispatcher = Dispatcher::new(RecordingTransport::default());
        let payload = CreateThing { code: "11".to_string() };

        let sent = dispatcher.send("test-queue", Some(&payload)).await;

        assert!(sent);
        let bodies = dispatcher.transport().bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].0, "test-queue");

        let env = MessageEnvelope::<CreateThing>::decode(&bodies[0].1).unwrap();
        assert_eq!(env.channel(), "test-queue");
        assert_eq!(env.message_type(), "CreateThing");
        assert_eq!(env.payload(), &payload);
    }

    #[tokio::test]
    async fn transport_failure_collapses_to_false() {
        let dispatcher = Dispatcher::new(RecordingTransport {
            fail_with: Some(TransportError::Unavailable("simulated".to_string())),
            ..RecordingTransport::default()
        });
        let payload = CreateThing { code: "11".to_string() };

        assert!(!dispatcher.send("test-queue", Some(&payload)).await);
        assert_eq!(dispatcher.transport().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn try_send_keeps_failures_distinct() {
        let dispatcher = Dispatcher::new(InMemoryTransport::new());
        let payload = CreateThing { code: "11".to_string() };

        let err = dispatcher.try_send("missing", Some(&payload)).await.unwrap_err();
        assert_eq!(err, DispatchError::ChannelNotFound("missing".to_string()));

        drop(dispatcher.transport().declare("closed"));
        let err = dispatcher.try_send("closed", Some(&payload)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }

    #[tokio::test]
    async fn message_id_matches_delivered_envelope() {
        let dispatcher = Dispatcher::new(InMemoryTransport::new());
        let mut sub = dispatcher.transport().declare("q");
        let payload = CreateThing { code: "47".to_string() };

        let id = dispatcher.try_send("q", Some(&payload)).await.unwrap();

        let body = sub.recv().await.unwrap();
        let env = MessageEnvelope::<CreateThing>::decode(&body).unwrap();
        assert_eq!(env.message_id(), id);
    }
}
