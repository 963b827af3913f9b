//! Herald integration test harness.
//!
//! Every test builds its own set of nodes on one shared in-process bus.
//! Each node is a full Discovery with its own transport handle, standing
//! in for a separate process. Delivery on the bus is synchronous, so a
//! hello has been ingested by every subscribed peer once `trigger` returns;
//! only answers to `Register` hellos run on spawned tasks and need
//! [`settle`].
//!
//!   cargo test --test integration

use std::sync::Arc;

use herald_core::Settings;
use herald_services::{Discovery, LocalBus};

mod calls;
mod handshake;
mod interests;
mod liveness;

// ── Harness ───────────────────────────────────────────────────────────────────

pub fn settings(namespace: &str, version: &str) -> Settings {
    Settings {
        namespace: namespace.into(),
        version: version.into(),
        ..Settings::default()
    }
}

/// A node on `bus` with the given settings.
pub fn node_with(bus: &Arc<LocalBus>, settings: Settings) -> Discovery {
    Discovery::new(Arc::new(bus.connect()), settings)
}

pub fn node(bus: &Arc<LocalBus>, namespace: &str, version: &str) -> Discovery {
    node_with(bus, settings(namespace, version))
}

/// Let spawned hello answers run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Register an echo worker that tags replies with `tag`.
pub fn serve_echo(d: &Discovery, topic: &str, fqn: &str, tag: &'static str) {
    d.register_worker(
        topic,
        move |m| herald_core::Message::from_bytes(m.body).with_header("tag", tag),
        fqn,
    );
}

#[test]
fn harness_nodes_start_empty() {
    let bus = LocalBus::new();
    let d = node(&bus, "ns1", "1.0");
    assert!(d.functions().is_empty());
    assert!(d.registry().is_empty());
    assert_eq!(d.settings().namespace, "ns1");
}
