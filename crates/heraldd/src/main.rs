//! heraldd: Herald demo node.

use std::sync::Arc;

use anyhow::Result;

use herald_core::config::HeraldConfig;
use herald_services::{Discovery, LocalBus};

mod builtin;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = HeraldConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = HeraldConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        HeraldConfig::default()
    });
    tracing::info!(
        namespace = %config.discovery.namespace,
        version = %config.discovery.version,
        "heraldd starting"
    );

    // Transport + discovery
    let bus = LocalBus::new();
    let discovery = Discovery::new(Arc::new(bus.connect()), config.discovery.clone());
    discovery.register_worker(
        &config.node.echo_topic,
        builtin::echo(discovery.settings().namespace.clone()),
        &config.node.echo_fqn,
    );
    discovery.start(false).await;

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let api_port = config.node.api_port;
    let api_task = {
        let state = herald_api::ApiState {
            discovery: discovery.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = herald_api::serve(state, api_port).await {
                tracing::error!(error = %e, "status server failed");
            }
        })
    };

    let route_printer = {
        let registry = discovery.registry().clone();
        let every = discovery.settings().discovery_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let routes = registry.snapshot();
                tracing::info!(count = routes.len(), "registry snapshot");
                for r in &routes {
                    tracing::info!(
                        address = %r.address,
                        last_seen_secs = r.last_seen_secs,
                        "  route"
                    );
                }
            }
        })
    };

    let probe_task = if config.node.probe_timeout > 0 {
        Some(tokio::spawn(builtin::probe_loop(
            discovery.clone(),
            config.node.echo_fqn.clone(),
            config.node.probe_timeout,
            discovery.settings().discovery_interval(),
        )))
    } else {
        None
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = api_task           => tracing::error!("API task exited: {:?}", r),
        r = route_printer      => tracing::error!("route printer exited: {:?}", r),
    }

    if let Some(task) = probe_task {
        task.abort();
    }
    discovery.close();
    bus.shutdown();

    Ok(())
}
