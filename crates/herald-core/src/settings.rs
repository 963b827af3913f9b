//! Discovery settings: process-wide, resolved once at construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::WILDCARD;
use crate::wire::DEFAULT_DISCOVERY_TOPIC;

pub const DEFAULT_VERSION: &str = "DEVELOPMENT";
pub const DEFAULT_MAX_AGE_SECS: u64 = 30;
pub const DEFAULT_DISCOVERY_INTERVAL_SECS: u64 = 15;
/// Upper bound for timer intervals. Longer values are clamped so timer
/// deadlines stay representable.
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace this process advertises in. `*` is global.
    pub namespace: String,
    /// Version this process advertises.
    pub version: String,
    /// Topic hellos are sent to and received from.
    pub discovery_topic: String,
    /// If non-empty, only these FQNs are kept in the registry.
    pub interests: Vec<String>,
    /// Seconds after which an unrefreshed address is considered dead.
    pub max_age: u64,
    /// Seconds between periodic hellos.
    pub discovery_interval: u64,
    /// Seconds between registry sweeps. 0 = never sweep, stale entries
    /// are only skipped at lookup time.
    pub expiry_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: WILDCARD.to_string(),
            version: DEFAULT_VERSION.to_string(),
            discovery_topic: DEFAULT_DISCOVERY_TOPIC.to_string(),
            interests: Vec::new(),
            max_age: DEFAULT_MAX_AGE_SECS,
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL_SECS,
            expiry_interval: 0,
        }
    }
}

impl Settings {
    /// Fill every empty or zero field with its default.
    pub fn with_defaults(mut self) -> Self {
        if self.namespace.is_empty() {
            self.namespace = WILDCARD.to_string();
        }
        if self.version.is_empty() {
            self.version = DEFAULT_VERSION.to_string();
        }
        if self.discovery_topic.is_empty() {
            self.discovery_topic = DEFAULT_DISCOVERY_TOPIC.to_string();
        }
        if self.max_age == 0 {
            self.max_age = DEFAULT_MAX_AGE_SECS;
        }
        if self.discovery_interval == 0 {
            self.discovery_interval = DEFAULT_DISCOVERY_INTERVAL_SECS;
        }
        self.discovery_interval = self.discovery_interval.min(MAX_INTERVAL_SECS);
        self.expiry_interval = self.expiry_interval.min(MAX_INTERVAL_SECS);
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval)
    }

    pub fn is_global(&self) -> bool {
        self.namespace == WILDCARD
    }
}
