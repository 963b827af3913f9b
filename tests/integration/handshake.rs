use crate::*;

/// A late joiner learns the existing node without waiting for its
/// periodic hello: the Register hello is answered straight away.
#[tokio::test]
async fn test_late_joiner_learns_existing_nodes() {
    let bus = LocalBus::new();
    let early = node(&bus, "*", "1.0");
    serve_echo(&early, "echo-early", "svc.early", "early");
    early.start(false).await;

    let late = node(&bus, "*", "1.0");
    serve_echo(&late, "echo-late", "svc.late", "late");
    late.start(false).await;

    // early heard late's Register hello synchronously.
    assert_eq!(early.find("svc.late", "").unwrap().topic(), "echo-late");

    // late hears early's answer once it has run.
    assert!(late.find("svc.early", "").is_err());
    settle().await;
    assert_eq!(late.find("svc.early", "").unwrap().topic(), "echo-early");
}

/// Three nodes starting one after another all converge without any
/// periodic hello firing.
#[tokio::test(start_paused = true)]
async fn test_three_nodes_converge_before_first_interval() {
    let bus = LocalBus::new();
    let nodes: Vec<Discovery> = (0..3).map(|_| node(&bus, "*", "1.0")).collect();
    for (i, n) in nodes.iter().enumerate() {
        let fqn = format!("svc.{i}");
        n.register_worker(&format!("t{i}"), |m| m, &fqn);
    }
    for n in &nodes {
        n.start(false).await;
    }
    settle().await;

    for (i, n) in nodes.iter().enumerate() {
        for j in 0..3 {
            if i == j {
                continue;
            }
            let fqn = format!("svc.{j}");
            assert!(n.find(&fqn, "").is_ok(), "node {i} missing {fqn}");
        }
    }
}

/// Without a Register answer, the periodic hello still spreads addresses.
#[tokio::test(start_paused = true)]
async fn test_periodic_hello_reaches_later_subscriber() {
    let bus = LocalBus::new();
    let server = node_with(
        &bus,
        Settings {
            discovery_interval: 5,
            ..settings("*", "1.0")
        },
    );
    serve_echo(&server, "echo", "svc.echo", "s");
    server.start(false).await;

    // A passive listener that never sends a Register hello.
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        use herald_services::{FunctionHandler, Transport};
        bus.connect().register(
            "discovery",
            FunctionHandler::eventer(move |m| seen.lock().unwrap().push(m)),
        );
    }

    tokio::time::advance(std::time::Duration::from_secs(5)).await;
    settle().await;

    let hellos = seen.lock().unwrap().clone();
    assert_eq!(hellos.len(), 1);
    assert!(!herald_core::wire::is_register(&hellos[0]));
    let addrs = herald_core::wire::decode_hello(&hellos[0]).unwrap();
    assert_eq!(addrs, server.functions());
}
