pub mod handlers;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// The `/api` router, without CORS or a listener.
pub fn router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/routes", get(handlers::handle_routes))
        .route("/functions", get(handlers::handle_functions))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "API listening on 127.0.0.1");
    axum::serve(listener, app).await?;
    Ok(())
}
