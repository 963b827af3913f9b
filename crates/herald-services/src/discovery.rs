//! Discovery: FQN routing on top of the transport façade.
//!
//! A [`Discovery`] advertises this process's functions to peers, ingests
//! peers' hellos into a [`Registry`], and resolves an FQN to a topic when
//! the caller triggers or requests it.
//!
//! Hello protocol:
//!   1. `start` publishes a hello flagged `Register: true`.
//!   2. Peers receiving a flagged hello answer with their own, unflagged.
//!   3. Every `discovery_interval` seconds an unflagged hello is re-sent.
//!
//! Every hello carries the full self-list. Peers upsert each address, which
//! refreshes its last-seen time; an address that stops being announced ages
//! out after `max_age`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};
use std::time::Duration;

use herald_core::{wire, Address, Message, Settings, TransportError, WILDCARD};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::handler::{Context, FunctionHandler};
use crate::registry::{self, Registry};
use crate::transport::SharedTransport;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid call: {0}")]
    InvalidCall(&'static str),
    #[error("{}", not_found_message(.fqn, .namespace, .version, .fell_back))]
    NotFound {
        fqn: String,
        namespace: String,
        version: String,
        /// The global namespace was tried after the local one.
        fell_back: bool,
    },
    #[error("request timed out")]
    Timeout,
    #[error(transparent)]
    Transport(TransportError),
}

impl DiscoveryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DiscoveryError::Timeout)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoveryError::NotFound { .. })
    }
}

impl From<TransportError> for DiscoveryError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => DiscoveryError::Timeout,
            other => DiscoveryError::Transport(other),
        }
    }
}

fn not_found_message(fqn: &str, namespace: &str, version: &str, fell_back: &bool) -> String {
    if *fell_back {
        format!(
            "no live address for {fqn} (version {version}) in namespace {namespace} or the global namespace"
        )
    } else {
        format!("no live address for {fqn} (version {version}) in namespace {namespace}")
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

struct Inner {
    transport: SharedTransport,
    registry: Registry,
    settings: Settings,
    funcs: RwLock<Vec<Address>>,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Runtime captured by `start`. Transports may deliver hellos on
    /// threads of their own.
    runtime: OnceLock<Handle>,
}

impl Inner {
    fn functions(&self) -> Vec<Address> {
        self.funcs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish the self-list. Failures are logged, never returned.
    async fn hello(&self, register: bool) {
        let funcs = self.functions();
        let message = match wire::encode_hello(&funcs, register) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode hello");
                return;
            }
        };
        match self
            .transport
            .trigger(&self.settings.discovery_topic, message)
            .await
        {
            Ok(()) => tracing::trace!(count = funcs.len(), register, "hello sent"),
            Err(e) => tracing::warn!(error = %e, register, "failed to send hello"),
        }
    }

    fn abort_tasks(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_tasks();
        if *self.started.get_mut() {
            self.transport.unregister(&self.settings.discovery_topic);
        }
        let funcs = self.funcs.get_mut().unwrap_or_else(PoisonError::into_inner);
        for address in funcs.iter() {
            self.transport.unregister(address.topic());
        }
    }
}

/// Handle to one process's discovery state. Cheap to clone.
///
/// Background loops stop when [`Discovery::close`] is called or the last
/// handle is dropped. Dropping the last handle also unbinds the discovery
/// topic and every registered function topic.
#[derive(Clone)]
pub struct Discovery {
    inner: Arc<Inner>,
}

impl Discovery {
    /// Empty or zero settings fields take their defaults.
    pub fn new(transport: SharedTransport, settings: Settings) -> Self {
        let settings = settings.with_defaults();
        let registry = Registry::new(settings.interests.iter().cloned());
        Self {
            inner: Arc::new(Inner {
                transport,
                registry,
                settings,
                funcs: RwLock::new(Vec::new()),
                started: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
                runtime: OnceLock::new(),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// This process's advertised addresses, in registration order.
    pub fn functions(&self) -> Vec<Address> {
        self.inner.functions()
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Bind `handler` to `topic` and advertise it under `fqn`.
    ///
    /// # Panics
    /// If `fqn` is empty. A function nobody can address is a wiring bug.
    pub fn register(&self, topic: &str, handler: FunctionHandler, fqn: &str) {
        assert!(
            !fqn.is_empty(),
            "function on topic {topic:?} registered without an fqn"
        );
        let settings = &self.inner.settings;
        let kind = handler.kind();
        self.inner.transport.register(topic, handler);

        let address = Address::new(fqn, topic, &settings.version, &settings.namespace);
        tracing::info!(fqn, topic, %kind, "function registered");
        self.inner
            .funcs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address);
    }

    pub fn register_worker(
        &self,
        topic: &str,
        f: impl Fn(Message) -> Message + Send + Sync + 'static,
        fqn: &str,
    ) {
        self.register(topic, FunctionHandler::worker(f), fqn);
    }

    pub fn register_eventer(
        &self,
        topic: &str,
        f: impl Fn(Message) + Send + Sync + 'static,
        fqn: &str,
    ) {
        self.register(topic, FunctionHandler::eventer(f), fqn);
    }

    pub fn register_handler(
        &self,
        topic: &str,
        f: impl Fn(Context) + Send + Sync + 'static,
        fqn: &str,
    ) {
        self.register(topic, FunctionHandler::handler(f), fqn);
    }

    /// Unbind `topic` and stop advertising it. Routes learned from peers
    /// are left alone.
    pub fn remove(&self, topic: &str) {
        self.inner.transport.unregister(topic);
        let mut funcs = self
            .inner
            .funcs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = funcs.len();
        funcs.retain(|a| a.topic() != topic);
        tracing::info!(topic, removed = before - funcs.len(), "function removed");
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Announce this process and begin listening for peers.
    ///
    /// The flagged hello goes out on every call. Subscribing and the
    /// background loops happen once. With `block`, waits on the
    /// transport's run loop.
    pub async fn start(&self, block: bool) {
        let _ = self.inner.runtime.set(Handle::current());
        self.inner.hello(true).await;

        if !self.inner.started.swap(true, Ordering::SeqCst) {
            self.subscribe();
            self.spawn_loops();
            let settings = &self.inner.settings;
            tracing::info!(
                namespace = %settings.namespace,
                version = %settings.version,
                topic = %settings.discovery_topic,
                functions = self.inner.functions().len(),
                "discovery started"
            );
        }

        if block {
            self.inner.transport.run().await;
        }
    }

    /// Stop the background loops and unbind the discovery topic.
    /// `start` may be called again afterwards.
    pub fn close(&self) {
        self.inner.abort_tasks();
        if self.inner.started.swap(false, Ordering::SeqCst) {
            self.inner
                .transport
                .unregister(&self.inner.settings.discovery_topic);
        }
        tracing::info!("discovery closed");
    }

    fn subscribe(&self) {
        let weak = Arc::downgrade(&self.inner);
        let handler = FunctionHandler::eventer(move |message| on_hello(&weak, message));
        self.inner
            .transport
            .register(&self.inner.settings.discovery_topic, handler);
    }

    fn spawn_loops(&self) {
        let settings = &self.inner.settings;
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        tasks.push(tokio::spawn(hello_loop(
            Arc::downgrade(&self.inner),
            settings.discovery_interval(),
        )));

        if settings.expiry_interval > 0 {
            tasks.push(tokio::spawn(registry::expiry_loop(
                self.inner.registry.clone(),
                settings.max_age(),
                Duration::from_secs(settings.expiry_interval),
            )));
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────────

    /// Fire-and-forget call to whichever peer serves `fqn`.
    pub async fn trigger(
        &self,
        fqn: &str,
        version: &str,
        message: Message,
    ) -> Result<(), DiscoveryError> {
        if fqn.is_empty() {
            return Err(DiscoveryError::InvalidCall("trigger requires an fqn"));
        }
        let address = self.find(fqn, version)?;
        tracing::trace!(fqn, topic = address.topic(), "trigger");
        self.inner
            .transport
            .trigger(address.topic(), message)
            .await?;
        Ok(())
    }

    /// Call whichever peer serves `fqn` and wait up to `timeout_secs` for
    /// its reply. A timeout does not affect the resolved route.
    pub async fn request(
        &self,
        fqn: &str,
        version: &str,
        message: Message,
        timeout_secs: u64,
    ) -> Result<Message, DiscoveryError> {
        if fqn.is_empty() {
            return Err(DiscoveryError::InvalidCall("request requires an fqn"));
        }
        let address = self.find(fqn, version)?;
        tracing::trace!(fqn, topic = address.topic(), timeout_secs, "request");
        let reply = self
            .inner
            .transport
            .request(address.topic(), message, timeout_secs)
            .await?;
        Ok(reply)
    }

    /// Resolve `fqn` in the local namespace, falling back to the global
    /// namespace only when no version was pinned.
    pub fn find(&self, fqn: &str, version: &str) -> Result<Address, DiscoveryError> {
        let version = if version.is_empty() { WILDCARD } else { version };
        let settings = &self.inner.settings;
        let registry = &self.inner.registry;
        let max_age = settings.max_age();

        if let Some(address) = registry.find(fqn, &settings.namespace, version, max_age) {
            tracing::debug!(fqn, version, topic = address.topic(), "resolved");
            return Ok(address);
        }

        let fall_back = settings.namespace != WILDCARD && version == WILDCARD;
        if fall_back {
            if let Some(address) = registry.find(fqn, WILDCARD, version, max_age) {
                tracing::debug!(fqn, version, topic = address.topic(), "resolved in global namespace");
                return Ok(address);
            }
        }

        tracing::debug!(fqn, version, namespace = %settings.namespace, "no route");
        Err(DiscoveryError::NotFound {
            fqn: fqn.to_string(),
            namespace: settings.namespace.clone(),
            version: version.to_string(),
            fell_back: fall_back,
        })
    }
}

// ── Background ────────────────────────────────────────────────────────────────

/// Ingest one hello from the discovery topic.
fn on_hello(inner: &Weak<Inner>, message: Message) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    if wire::is_register(&message) {
        match inner.runtime.get() {
            Some(runtime) => {
                tracing::debug!("peer registered, answering with hello");
                let answer = Arc::clone(&inner);
                runtime.spawn(async move { answer.hello(false).await });
            }
            None => tracing::warn!("register hello before start, not answering"),
        }
    }

    match wire::decode_hello(&message) {
        Ok(addresses) => {
            tracing::debug!(count = addresses.len(), "hello received");
            for address in addresses {
                inner.registry.update(address);
            }
        }
        Err(e) => tracing::warn!(error = %e, "dropping undecodable hello"),
    }
}

/// Re-announce on a fixed interval. The first tick is one interval after
/// start, since `start` has just sent the flagged hello.
///
/// Ends once the owning [`Discovery`] is gone.
async fn hello_loop(inner: Weak<Inner>, every: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + every, every);

    loop {
        interval.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.hello(false).await;
    }
}
