//! In-process transport.
//!
//! A [`LocalBus`] is a shared topic table; every simulated process gets its
//! own [`LocalTransport`] handle on it. Triggers fan out to every subscriber
//! of a topic. Requests go to one subscriber, chosen round robin across the
//! topic's subscribers, and wait for its reply.
//!
//! Handlers run synchronously on the publishing task. A handler that needs
//! to do async work spawns it.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use herald_core::{Message, TransportError};
use tokio::sync::{oneshot, watch};

use crate::handler::{Context, FunctionHandler};
use crate::transport::{SharedTransport, Transport};

struct Subscription {
    owner: u64,
    handler: FunctionHandler,
}

/// Shared topic table.
pub struct LocalBus {
    topics: DashMap<String, Vec<Subscription>>,
    cursors: DashMap<String, AtomicUsize>,
    next_owner: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl LocalBus {
    pub fn new() -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            topics: DashMap::new(),
            cursors: DashMap::new(),
            next_owner: AtomicU64::new(1),
            shutdown,
        })
    }

    /// A new transport handle, standing in for one process.
    pub fn connect(self: &Arc<Self>) -> LocalTransport {
        LocalTransport {
            bus: Arc::clone(self),
            owner: self.next_owner.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Stop accepting messages and release every `run()` waiter.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Number of subscriptions bound to a topic, across all handles.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }

    // Handlers are cloned out so none runs while a map shard is locked.
    fn subscribers(&self, topic: &str) -> Vec<(u64, FunctionHandler)> {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().map(|s| (s.owner, s.handler.clone())).collect())
            .unwrap_or_default()
    }

    fn pick(&self, topic: &str) -> Option<(u64, FunctionHandler)> {
        let subs = self.subscribers(topic);
        if subs.is_empty() {
            return None;
        }
        let n = self
            .cursors
            .entry(topic.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
        let len = subs.len();
        subs.into_iter().nth(n % len)
    }
}

/// One process's handle on a [`LocalBus`].
#[derive(Clone)]
pub struct LocalTransport {
    bus: Arc<LocalBus>,
    owner: u64,
}

impl LocalTransport {
    fn handle_for(&self, owner: u64) -> SharedTransport {
        Arc::new(LocalTransport {
            bus: Arc::clone(&self.bus),
            owner,
        })
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn trigger(&self, topic: &str, message: Message) -> Result<(), TransportError> {
        if self.bus.is_shut_down() {
            return Err(TransportError::Closed);
        }
        let subs = self.bus.subscribers(topic);
        tracing::trace!(topic, subscribers = subs.len(), "local trigger");
        for (owner, handler) in subs {
            handler.invoke(Context::new(message.clone(), None, self.handle_for(owner)));
        }
        Ok(())
    }

    async fn request(
        &self,
        topic: &str,
        message: Message,
        timeout_secs: u64,
    ) -> Result<Message, TransportError> {
        if self.bus.is_shut_down() {
            return Err(TransportError::Closed);
        }
        let (owner, handler) = self
            .bus
            .pick(topic)
            .ok_or_else(|| TransportError::NoResponders(topic.to_string()))?;

        let (tx, rx) = oneshot::channel();
        handler.invoke(Context::new(message, Some(tx), self.handle_for(owner)));

        match tokio::time::timeout(Duration::from_secs(timeout_secs), rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(TransportError::NoReply(topic.to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn register(&self, topic: &str, handler: FunctionHandler) {
        tracing::debug!(topic, owner = self.owner, kind = %handler.kind(), "local subscribe");
        self.bus
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(Subscription {
                owner: self.owner,
                handler,
            });
    }

    fn unregister(&self, topic: &str) {
        let owner = self.owner;
        let mut emptied = false;
        if let Some(mut subs) = self.bus.topics.get_mut(topic) {
            subs.retain(|s| s.owner != owner);
            emptied = subs.is_empty();
        }
        if emptied {
            self.bus.topics.remove_if(topic, |_, subs| subs.is_empty());
        }
        tracing::debug!(topic, owner, "local unsubscribe");
    }

    async fn run(&self) {
        let mut rx = self.bus.shutdown.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}
