//! Transport façade: the pub/sub layer discovery is built on.
//!
//! Discovery never talks to a broker itself. Anything that can publish to a
//! topic, do a correlated request/reply with a timeout, and bind a handler
//! to a topic can carry it. [`crate::local::LocalTransport`] is the
//! in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{Message, TransportError};

use crate::handler::FunctionHandler;

/// Contract between discovery and the underlying pub/sub transport.
///
/// Implementations map their own request-timeout failure to
/// [`TransportError::Timeout`] so callers can tell it apart from other
/// transport failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fire-and-forget publish.
    async fn trigger(&self, topic: &str, message: Message) -> Result<(), TransportError>;

    /// Publish and wait up to `timeout_secs` for a correlated reply.
    async fn request(
        &self,
        topic: &str,
        message: Message,
        timeout_secs: u64,
    ) -> Result<Message, TransportError>;

    /// Bind a handler to a topic.
    fn register(&self, topic: &str, handler: FunctionHandler);

    /// Unbind everything this transport handle bound to a topic.
    fn unregister(&self, topic: &str);

    /// Block until the transport shuts down.
    async fn run(&self);
}

pub type SharedTransport = Arc<dyn Transport>;
