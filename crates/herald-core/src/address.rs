//! Address: one advertised function endpoint.
//!
//! An Address binds a logical function name (FQN) to the physical topic it
//! is reachable on, scoped by namespace and version. Addresses travel inside
//! hello payloads as JSON objects `{fqn, topic, version, namespace}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Matches any namespace or version. Also the global namespace.
pub const WILDCARD: &str = "*";

/// An advertised endpoint. Immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    fqn: String,
    topic: String,
    version: String,
    namespace: String,
}

impl Address {
    pub fn new(
        fqn: impl Into<String>,
        topic: impl Into<String>,
        version: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            fqn: fqn.into(),
            topic: topic.into(),
            version: version.into(),
            namespace: namespace.into(),
        }
    }

    /// Fully-qualified function name.
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// Pub/sub topic the function is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{} -> {}",
            self.fqn, self.namespace, self.version, self.topic
        )
    }
}
