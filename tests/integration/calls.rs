use crate::*;

use herald_core::{wire, Address, Message};
use herald_services::{DiscoveryError, Transport};

/// P serves svc.echo on "echo"; Q resolves and calls it.
#[tokio::test]
async fn test_request_resolves_to_announced_topic() {
    let bus = LocalBus::new();
    let p = node(&bus, "ns1", "1.0");
    let q = node(&bus, "ns1", "1.0");
    serve_echo(&p, "echo", "svc.echo", "p");

    q.start(false).await;
    p.start(false).await;

    let resolved = q.find("svc.echo", "1.0").expect("q should know svc.echo");
    assert_eq!(resolved.topic(), "echo");
    assert_eq!(resolved.namespace(), "ns1");

    let reply = q
        .request("svc.echo", "1.0", Message::text("ping"), 1)
        .await
        .expect("request should succeed");
    assert_eq!(reply.as_text(), Some("ping"));
    assert_eq!(reply.header("tag"), Some("p"));
}

/// Two versions of one FQN behind different topics: unpinned calls
/// alternate, pinned calls stick.
#[tokio::test]
async fn test_versions_round_robin_and_pin() {
    let bus = LocalBus::new();
    let client = node(&bus, "*", "1.0");
    let v1 = node(&bus, "*", "1.0");
    let v2 = node(&bus, "*", "2.0");
    serve_echo(&v1, "echo-v1", "svc.echo", "v1");
    serve_echo(&v2, "echo-v2", "svc.echo", "v2");

    client.start(false).await;
    v1.start(false).await;
    v2.start(false).await;

    let mut tags = Vec::new();
    for _ in 0..6 {
        let reply = client
            .request("svc.echo", "", Message::empty(), 1)
            .await
            .unwrap();
        tags.push(reply.header("tag").unwrap().to_string());
    }
    assert_eq!(tags.iter().filter(|t| *t == "v1").count(), 3);
    assert_eq!(tags.iter().filter(|t| *t == "v2").count(), 3);

    for _ in 0..4 {
        let reply = client
            .request("svc.echo", "2.0", Message::empty(), 1)
            .await
            .unwrap();
        assert_eq!(reply.header("tag"), Some("v2"));
    }
}

/// Same FQN, namespace, and version from two nodes is one route; the
/// latest announcement decides the topic.
#[tokio::test]
async fn test_same_version_latest_announcement_wins() {
    let bus = LocalBus::new();
    let client = node(&bus, "*", "1.0");
    let a = node(&bus, "*", "1.0");
    let b = node(&bus, "*", "1.0");
    serve_echo(&a, "echo-a", "svc.echo", "a");
    serve_echo(&b, "echo-b", "svc.echo", "b");

    client.start(false).await;
    a.start(false).await;
    b.start(false).await;
    settle().await;

    assert_eq!(client.registry().route_count("svc.echo", "*"), 1);
    let topic = client.find("svc.echo", "1.0").unwrap().topic().to_string();
    assert!(topic == "echo-a" || topic == "echo-b", "got {topic}");

    let late = vec![Address::new("svc.echo", "echo-c", "1.0", "*")];
    bus.connect()
        .trigger("discovery", wire::encode_hello(&late, false).unwrap())
        .await
        .unwrap();

    assert_eq!(client.registry().route_count("svc.echo", "*"), 1);
    assert_eq!(client.find("svc.echo", "1.0").unwrap().topic(), "echo-c");
}

#[tokio::test]
async fn test_trigger_reaches_eventer() {
    let bus = LocalBus::new();
    let sink = node(&bus, "*", "1.0");
    let caller = node(&bus, "*", "1.0");

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        sink.register_eventer(
            "audit",
            move |m| seen.lock().unwrap().push(m.as_text().unwrap_or("").to_string()),
            "svc.audit",
        );
    }

    caller.start(false).await;
    sink.start(false).await;

    caller
        .trigger("svc.audit", "", Message::text("logged in"))
        .await
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["logged in"]);
}

#[tokio::test]
async fn test_handler_can_forward() {
    let bus = LocalBus::new();
    let front = node(&bus, "*", "1.0");
    let back = node(&bus, "*", "1.0");
    let caller = node(&bus, "*", "1.0");

    let seen = Arc::new(std::sync::Mutex::new(0usize));
    {
        let seen = seen.clone();
        back.register_eventer("store", move |_| *seen.lock().unwrap() += 1, "svc.store");
    }
    front.register_handler(
        "ingest",
        |ctx| {
            tokio::spawn(async move {
                let _ = ctx.forward("store").await;
            });
        },
        "svc.ingest",
    );

    caller.start(false).await;
    front.start(false).await;
    back.start(false).await;

    caller
        .trigger("svc.ingest", "", Message::text("row"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_fqn_is_not_found() {
    let bus = LocalBus::new();
    let q = node(&bus, "ns1", "1.0");
    q.start(false).await;

    let err = q
        .request("svc.missing", "", Message::empty(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::NotFound { .. }), "got {err}");
    assert!(err.to_string().contains("svc.missing"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_server_times_out_and_keeps_route() {
    let bus = LocalBus::new();
    let client = node(&bus, "*", "1.0");
    let server = node(&bus, "*", "1.0");
    // Parks every request without answering.
    let parked = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let parked = parked.clone();
        server.register_handler("slow", move |ctx| parked.lock().unwrap().push(ctx), "svc.slow");
    }

    client.start(false).await;
    server.start(false).await;

    let err = client
        .request("svc.slow", "", Message::empty(), 2)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(client.find("svc.slow", "").is_ok());
}
