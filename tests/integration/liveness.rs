use crate::*;

use std::time::Duration;

use herald_core::Message;

fn fast(namespace: &str) -> Settings {
    Settings {
        max_age: 10,
        discovery_interval: 3,
        ..settings(namespace, "1.0")
    }
}

/// Periodic hellos keep a live node resolvable well past max_age.
#[tokio::test(start_paused = true)]
async fn test_live_node_stays_fresh() {
    let bus = LocalBus::new();
    let client = node_with(&bus, fast("*"));
    let server = node_with(&bus, fast("*"));
    serve_echo(&server, "echo", "svc.echo", "s");

    client.start(false).await;
    server.start(false).await;

    for _ in 0..10 {
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
    }
    assert!(client.find("svc.echo", "").is_ok());
}

/// A node that stops announcing ages out of its peers' lookups.
#[tokio::test(start_paused = true)]
async fn test_closed_node_ages_out() {
    let bus = LocalBus::new();
    let client = node_with(&bus, fast("*"));
    let server = node_with(&bus, fast("*"));
    serve_echo(&server, "echo", "svc.echo", "s");

    client.start(false).await;
    server.start(false).await;
    assert!(client.find("svc.echo", "").is_ok());

    server.close();
    tokio::time::advance(Duration::from_secs(11)).await;
    settle().await;

    assert!(client.find("svc.echo", "").unwrap_err().is_not_found());
    // Lazily skipped, not removed.
    assert_eq!(client.registry().len(), 1);
}

/// With the sweep enabled, a dead node's routes are removed outright.
#[tokio::test(start_paused = true)]
async fn test_sweep_removes_dead_routes() {
    let bus = LocalBus::new();
    let client = node_with(
        &bus,
        Settings {
            expiry_interval: 2,
            ..fast("*")
        },
    );
    let server = node_with(&bus, fast("*"));
    serve_echo(&server, "echo", "svc.echo", "s");

    client.start(false).await;
    server.start(false).await;
    assert_eq!(client.registry().len(), 1);

    drop(server);
    // The dropped node no longer answers on its function topic.
    assert_eq!(bus.subscriber_count("echo"), 0);
    for _ in 0..7 {
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
    }

    assert!(client.registry().is_empty());
}

/// A node that comes back is resolvable again on its first hello.
#[tokio::test(start_paused = true)]
async fn test_restarted_node_is_resolvable_again() {
    let bus = LocalBus::new();
    let client = node_with(&bus, fast("*"));
    let server = node_with(&bus, fast("*"));
    serve_echo(&server, "echo", "svc.echo", "s");

    client.start(false).await;
    server.start(false).await;
    server.close();
    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(client.find("svc.echo", "").is_err());

    server.start(false).await;
    let reply = client
        .request("svc.echo", "", Message::text("back"), 1)
        .await
        .unwrap();
    assert_eq!(reply.as_text(), Some("back"));
}
