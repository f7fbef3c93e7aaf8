//! Fire-and-forget messaging: envelopes, transports, and the dispatcher.
//!
//! The dispatcher hands a typed payload to a named channel and reports only
//! whether the transport accepted it. Delivery to (and processing by) the
//! consumer on the other side of the channel is the transport's business.

pub mod dispatcher;
pub mod envelope;
pub mod in_memory;
pub mod transport;

pub use dispatcher::{DispatchError, Dispatcher};
pub use envelope::MessageEnvelope;
pub use in_memory::{InMemoryTransport, Subscription};
pub use transport::{MessageTransport, TransportError};
