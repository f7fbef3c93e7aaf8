//! In-memory queue transport for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::transport::{MessageTransport, TransportError};

/// Receiving end of a declared in-memory channel.
///
/// Each channel has exactly one subscription (queue semantics, not fan-out).
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Wait for the next message body. `None` once the channel is removed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Try to receive a message body without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// In-memory point-to-point queue transport.
///
/// - Channels must be declared before anything can be published to them
/// - Publishing to an undeclared channel fails with `ChannelNotFound`
/// - Publishing to a channel whose subscription was dropped fails with `Unavailable`
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    channels: RwLock<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `channel` and return its subscription.
    ///
    /// Re-declaring a channel replaces the previous subscription.
    pub fn declare(&self, channel: impl Into<String>) -> Subscription {
        let channel = channel.into();
        let (tx, rx) = mpsc::unbounded_channel();

        if let Ok(mut map) = self.channels.write() {
            map.insert(channel.clone(), tx);
        }

        Subscription {
            channel,
            receiver: rx,
        }
    }

    /// Remove a channel. Its subscription drains what was already queued, then ends.
    pub fn remove(&self, channel: &str) -> bool {
        match self.channels.write() {
            Ok(mut map) => map.remove(channel).is_some(),
            Err(_) => false,
        }
    }

    pub fn is_declared(&self, channel: &str) -> bool {
        self.channels
            .read()
            .map(|map| map.contains_key(channel))
            .unwrap_or(false)
    }
}

#[async_trait]
impl MessageTransport for InMemoryTransport {
    async fn publish(&self, channel: &str, body: String) -> Result<(), TransportError> {
        let sender = {
            let map = self
                .channels
                .read()
                .map_err(|_| TransportError::Unavailable("channel registry poisoned".to_string()))?;
            map.get(channel)
                .cloned()
                .ok_or_else(|| TransportError::ChannelNotFound(channel.to_string()))?
        };

        sender
            .send(body)
            .map_err(|_| TransportError::Unavailable(format!("channel '{channel}' has no subscriber")))
    }
}
