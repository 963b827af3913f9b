use crate::*;

/// A node with interests only keeps routes for those FQNs.
#[tokio::test]
async fn test_interests_limit_registry() {
    let bus = LocalBus::new();
    let picky = node_with(
        &bus,
        Settings {
            interests: vec!["svc.a".into()],
            ..settings("*", "1.0")
        },
    );
    let server = node(&bus, "*", "1.0");
    serve_echo(&server, "ta", "svc.a", "a");
    serve_echo(&server, "tb", "svc.b", "b");

    picky.start(false).await;
    server.start(false).await;

    assert!(picky.find("svc.a", "").is_ok());
    assert!(picky.find("svc.b", "").is_err());
    assert_eq!(picky.registry().len(), 1);
}

/// Interests only filter what a node learns, not what it advertises.
#[tokio::test]
async fn test_interests_do_not_hide_own_functions() {
    let bus = LocalBus::new();
    let picky = node_with(
        &bus,
        Settings {
            interests: vec!["svc.other".into()],
            ..settings("*", "1.0")
        },
    );
    serve_echo(&picky, "tp", "svc.picky", "p");
    let client = node(&bus, "*", "1.0");

    client.start(false).await;
    picky.start(false).await;

    assert_eq!(client.find("svc.picky", "").unwrap().topic(), "tp");
}
