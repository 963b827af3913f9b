//! Function handlers: what a topic is bound to.
//!
//! Three shapes of function can be registered:
//! - Worker:  takes a message, returns the reply.
//! - Eventer: takes a message, never replies.
//! - Handler: takes a [`Context`] and decides for itself when (or whether)
//!   to reply, trigger, or forward.
//!
//! The shape is fixed at registration time. Transports only ever call
//! [`FunctionHandler::invoke`].

use std::fmt;
use std::sync::Arc;

use herald_core::{Message, TransportError};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::transport::SharedTransport;

pub type WorkerFn = dyn Fn(Message) -> Message + Send + Sync;
pub type EventerFn = dyn Fn(Message) + Send + Sync;
pub type HandlerFn = dyn Fn(Context) + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Worker,
    Eventer,
    Handler,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerKind::Worker => "worker",
            HandlerKind::Eventer => "eventer",
            HandlerKind::Handler => "handler",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub enum FunctionHandler {
    Worker(Arc<WorkerFn>),
    Eventer(Arc<EventerFn>),
    Handler(Arc<HandlerFn>),
}

impl FunctionHandler {
    pub fn worker(f: impl Fn(Message) -> Message + Send + Sync + 'static) -> Self {
        Self::Worker(Arc::new(f))
    }

    pub fn eventer(f: impl Fn(Message) + Send + Sync + 'static) -> Self {
        Self::Eventer(Arc::new(f))
    }

    pub fn handler(f: impl Fn(Context) + Send + Sync + 'static) -> Self {
        Self::Handler(Arc::new(f))
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Worker(_) => HandlerKind::Worker,
            Self::Eventer(_) => HandlerKind::Eventer,
            Self::Handler(_) => HandlerKind::Handler,
        }
    }

    /// Deliver one message.
    ///
    /// A worker's return value becomes the reply when the caller expects
    /// one. An eventer drops the reply slot, so a request against it fails
    /// with [`TransportError::NoReply`].
    pub fn invoke(&self, ctx: Context) {
        match self {
            Self::Worker(f) => {
                let (message, reply, _) = ctx.into_parts();
                let response = f(message);
                if let Some(reply) = reply {
                    let _ = reply.send(response);
                }
            }
            Self::Eventer(f) => f(ctx.into_parts().0),
            Self::Handler(f) => f(ctx),
        }
    }
}

impl fmt::Debug for FunctionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionHandler").field(&self.kind()).finish()
    }
}

/// One delivery to a [`FunctionHandler::Handler`].
pub struct Context {
    message: Message,
    reply: Option<oneshot::Sender<Message>>,
    transport: SharedTransport,
}

impl Context {
    pub fn new(
        message: Message,
        reply: Option<oneshot::Sender<Message>>,
        transport: SharedTransport,
    ) -> Self {
        Self {
            message,
            reply,
            transport,
        }
    }

    pub fn body(&self) -> &Message {
        &self.message
    }

    /// Whether the sender is waiting for a reply.
    pub fn is_rpc(&self) -> bool {
        self.reply.is_some()
    }

    /// Answer the request. Only the first reply is delivered.
    pub fn reply(&mut self, message: Message) -> Result<(), TransportError> {
        let reply = self.reply.take().ok_or(TransportError::UnexpectedReply)?;
        if reply.send(message).is_err() {
            tracing::trace!("requester gone before reply was sent");
        }
        Ok(())
    }

    /// Answer the request with a JSON body.
    pub fn reply_json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), TransportError> {
        let message = Message::json(body)?;
        self.reply(message)
    }

    pub async fn trigger(&self, topic: &str, message: Message) -> Result<(), TransportError> {
        self.transport.trigger(topic, message).await
    }

    pub async fn request(
        &self,
        topic: &str,
        message: Message,
        timeout_secs: u64,
    ) -> Result<Message, TransportError> {
        self.transport.request(topic, message, timeout_secs).await
    }

    /// Pass the message on to another topic as an event.
    pub async fn forward(&self, topic: &str) -> Result<(), TransportError> {
        self.transport.trigger(topic, self.message.clone()).await
    }

    pub fn into_parts(self) -> (Message, Option<oneshot::Sender<Message>>, SharedTransport) {
        (self.message, self.reply, self.transport)
    }
}
