//! Address registry: tracks which peers serve which functions.
//!
//! Three levels: FQN → namespace → version list. The version list is an
//! ordered run of routes with a round-robin cursor; each route carries the
//! time its address was last announced.
//!
//! The registry is populated by the hello listener and read by callers
//! resolving an FQN. Stale routes are skipped at lookup time; `expire`
//! removes them for good.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use herald_core::{Address, WILDCARD};
use serde::Serialize;
use tokio::time::Instant;

// ── Routes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Route {
    address: Address,
    last_seen: Instant,
}

impl Route {
    fn is_fresh(&self, max_age: Duration) -> bool {
        self.last_seen.elapsed() <= max_age
    }
}

/// Routes for one (FQN, namespace), one per version.
#[derive(Debug)]
struct VersionIndex {
    routes: Vec<Route>,
    /// 1-based position of the last route handed out.
    index: usize,
}

impl VersionIndex {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            index: 1,
        }
    }

    /// Upsert by version. The most recent announcement wins.
    fn update(&mut self, address: Address) {
        let now = Instant::now();
        match self
            .routes
            .iter_mut()
            .find(|r| r.address.version() == address.version())
        {
            Some(route) => {
                route.address = address;
                route.last_seen = now;
            }
            None => self.routes.push(Route {
                address,
                last_seen: now,
            }),
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        if self.index > self.routes.len() {
            self.index = 1;
        }
    }

    /// Position of the next route matching `version`.
    ///
    /// Every attempt moves the cursor, matching or not. Gives up once the
    /// attempts exceed the list length.
    fn next(&mut self, version: &str) -> Option<usize> {
        if self.routes.is_empty() {
            return None;
        }
        let mut attempts = 0;
        while attempts <= self.routes.len() {
            self.advance();
            let pos = self.index - 1;
            if version == WILDCARD || self.routes[pos].address.version() == version {
                return Some(pos);
            }
            attempts += 1;
        }
        None
    }

    /// The candidate the cursor lands on, if it is fresh. A stale candidate
    /// is not skipped in favour of another one.
    fn find(&mut self, version: &str, max_age: Duration) -> Option<Address> {
        let pos = self.next(version)?;
        let route = &self.routes[pos];
        if route.is_fresh(max_age) {
            Some(route.address.clone())
        } else {
            tracing::trace!(address = %route.address, "route is stale");
            None
        }
    }

    fn expire(&mut self, max_age: Duration) -> usize {
        let before = self.routes.len();
        self.routes.retain(|r| r.is_fresh(max_age));
        if self.index > self.routes.len() {
            self.index = self.routes.len().max(1);
        }
        before - self.routes.len()
    }
}

/// Version lists for one FQN, keyed by exact namespace.
#[derive(Debug, Default)]
struct NamespaceIndex {
    versions: HashMap<String, VersionIndex>,
}

impl NamespaceIndex {
    fn update(&mut self, address: Address) {
        self.versions
            .entry(address.namespace().to_string())
            .or_insert_with(VersionIndex::new)
            .update(address);
    }

    fn find(&mut self, namespace: &str, version: &str, max_age: Duration) -> Option<Address> {
        self.versions.get_mut(namespace)?.find(version, max_age)
    }

    fn expire(&mut self, max_age: Duration) -> usize {
        let mut removed = 0;
        self.versions.retain(|_, vi| {
            removed += vi.expire(max_age);
            !vi.routes.is_empty()
        });
        removed
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// A registry entry as exposed to status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub address: Address,
    pub last_seen_secs: u64,
}

/// The address registry, shared between the hello listener, the expiry
/// task, and callers resolving functions.
///
/// Sharded by FQN. A lookup holds its FQN's shard exclusively because
/// it moves the round-robin cursor.
#[derive(Clone, Default)]
pub struct Registry {
    routes: Arc<DashMap<String, NamespaceIndex>>,
    interests: Arc<HashSet<String>>,
}

impl Registry {
    /// A registry that keeps only the given FQNs. An empty set keeps all.
    pub fn new<I, S>(interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            routes: Arc::new(DashMap::new()),
            interests: Arc::new(interests.into_iter().map(Into::into).collect()),
        }
    }

    fn is_interesting(&self, fqn: &str) -> bool {
        self.interests.is_empty() || self.interests.contains(fqn)
    }

    /// Record that `address` was just announced.
    pub fn update(&self, address: Address) {
        if !self.is_interesting(address.fqn()) {
            tracing::trace!(fqn = address.fqn(), "ignoring uninteresting fqn");
            return;
        }
        self.routes
            .entry(address.fqn().to_string())
            .or_default()
            .update(address);
    }

    /// Next live address for the FQN in exactly `namespace`, round robin
    /// over the routes whose version matches. Empty arguments mean `*`.
    pub fn find(
        &self,
        fqn: &str,
        namespace: &str,
        version: &str,
        max_age: Duration,
    ) -> Option<Address> {
        let fqn = or_wildcard(fqn);
        let namespace = or_wildcard(namespace);
        let version = or_wildcard(version);

        self.routes
            .get_mut(fqn)?
            .find(namespace, version, max_age)
    }

    /// Drop every route older than `max_age`, and any level left empty.
    /// Returns the number of routes removed.
    pub fn expire(&self, max_age: Duration) -> usize {
        let mut removed = 0;
        self.routes.retain(|_, ns| {
            removed += ns.expire(max_age);
            !ns.versions.is_empty()
        });
        removed
    }

    /// Every route, ordered by FQN, namespace, then version.
    pub fn snapshot(&self) -> Vec<RouteInfo> {
        let mut out: Vec<RouteInfo> = self
            .routes
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .versions
                    .values()
                    .flat_map(|vi| vi.routes.iter())
                    .map(|r| RouteInfo {
                        address: r.address.clone(),
                        last_seen_secs: r.last_seen.elapsed().as_secs(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        out.sort_by(|a, b| {
            (a.address.fqn(), a.address.namespace(), a.address.version()).cmp(&(
                b.address.fqn(),
                b.address.namespace(),
                b.address.version(),
            ))
        });
        out
    }

    /// Total number of routes held.
    pub fn len(&self) -> usize {
        self.routes
            .iter()
            .map(|e| e.value().versions.values().map(|vi| vi.routes.len()).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of routes for one (FQN, namespace).
    pub fn route_count(&self, fqn: &str, namespace: &str) -> usize {
        self.routes
            .get(fqn)
            .and_then(|ns| ns.versions.get(namespace).map(|vi| vi.routes.len()))
            .unwrap_or(0)
    }
}

fn or_wildcard(s: &str) -> &str {
    if s.is_empty() {
        WILDCARD
    } else {
        s
    }
}

/// Remove stale registry entries on a fixed interval.
///
/// Runs forever. Cancel by dropping or aborting the task handle.
pub async fn expiry_loop(registry: Registry, max_age: Duration, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        let removed = registry.expire(max_age);
        if removed > 0 {
            tracing::debug!(removed, "expired registry routes");
        }
    }
}
