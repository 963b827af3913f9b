//! Node status, routes, and functions commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    namespace: String,
    version: String,
    discovery_topic: String,
    max_age_secs: u64,
    discovery_interval_secs: u64,
    functions: usize,
    routes: usize,
}

#[derive(Deserialize)]
struct AddressInfo {
    fqn: String,
    topic: String,
    version: String,
    namespace: String,
}

#[derive(Deserialize)]
struct RouteInfo {
    address: AddressInfo,
    last_seen_secs: u64,
}

#[derive(Deserialize)]
struct RoutesResponse {
    routes: Vec<RouteInfo>,
}

#[derive(Deserialize)]
struct FunctionsResponse {
    functions: Vec<AddressInfo>,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Herald Node Status");
    println!("═══════════════════════════════════════");
    println!("  Namespace        : {}", resp.namespace);
    println!("  Version          : {}", resp.version);
    println!("  Discovery topic  : {}", resp.discovery_topic);
    println!("  Max age          : {}s", resp.max_age_secs);
    println!("  Hello interval   : {}s", resp.discovery_interval_secs);
    println!("  Own functions    : {}", resp.functions);
    println!("  Known routes     : {}", resp.routes);

    Ok(())
}

pub async fn cmd_routes(port: u16) -> Result<()> {
    let resp: RoutesResponse = get_json(&format!("{}/routes", base_url(port))).await?;

    if resp.routes.is_empty() {
        println!("No routes learned yet.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Known Routes ({})", resp.routes.len());
    println!("═══════════════════════════════════════");

    for r in &resp.routes {
        let a = &r.address;
        println!("  ┌─ {}", a.fqn);
        println!("  │  namespace : {}", a.namespace);
        println!("  │  version   : {}", a.version);
        println!("  │  topic     : {}", a.topic);
        println!("  └─ last seen : {}s ago", r.last_seen_secs);
    }

    Ok(())
}

pub async fn cmd_functions(port: u16) -> Result<()> {
    let resp: FunctionsResponse = get_json(&format!("{}/functions", base_url(port))).await?;

    if resp.functions.is_empty() {
        println!("No functions registered.");
        return Ok(());
    }

    println!("{:<28} {:<20} {:<14} NAMESPACE", "FQN", "TOPIC", "VERSION");
    for f in &resp.functions {
        println!(
            "{:<28} {:<20} {:<14} {}",
            f.fqn, f.topic, f.version, f.namespace
        );
    }

    Ok(())
}
