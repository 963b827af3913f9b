//! /status, /routes, /functions handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use herald_core::Address;
use herald_services::RouteInfo;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub namespace: String,
    pub version: String,
    pub discovery_topic: String,
    pub max_age_secs: u64,
    pub discovery_interval_secs: u64,
    pub functions: usize,
    pub routes: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let settings = state.discovery.settings();
    Json(StatusResponse {
        namespace: settings.namespace.clone(),
        version: settings.version.clone(),
        discovery_topic: settings.discovery_topic.clone(),
        max_age_secs: settings.max_age,
        discovery_interval_secs: settings.discovery_interval,
        functions: state.discovery.functions().len(),
        routes: state.discovery.registry().len(),
    })
}

// ── /routes ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteInfo>,
}

pub async fn handle_routes(State(state): State<ApiState>) -> Json<RoutesResponse> {
    Json(RoutesResponse {
        routes: state.discovery.registry().snapshot(),
    })
}

// ── /functions ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FunctionsResponse {
    pub functions: Vec<Address>,
}

pub async fn handle_functions(State(state): State<ApiState>) -> Json<FunctionsResponse> {
    Json(FunctionsResponse {
        functions: state.discovery.functions(),
    })
}
