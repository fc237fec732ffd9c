pub mod auth;
pub mod error;
pub mod response;
pub mod routes;
pub mod slack;
pub mod state;
pub mod upstream;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // Slack
        .route("/slack/commands", post(routes::slack::slash_command))
        .route("/slack/events", post(routes::slack::events))
        // REST
        .route("/api/v1/auth/me", get(routes::auth::me))
        .route(
            "/api/v1/activity",
            get(routes::activity::list_activity).post(routes::commands::run_activity),
        )
        .route("/api/v1/commands", post(routes::commands::run_command))
        .route("/api/v1/{tool}", post(routes::commands::run_tool))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the gateway until the process is stopped.
pub async fn serve(app_state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Serve on a pre-bound listener, so callers can bind port 0 and read the
/// chosen port first.
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let app = build_router(app_state);
    tracing::info!("REI gateway listening on http://{local}");
    axum::serve(listener, app).await?;
    Ok(())
}
