pub mod http;
pub mod state;
pub mod ws_common;
pub mod ws_events;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Routes exactly as the JSON-over-HTTP binding's spec: Hub under
/// `/sims/hub`, Publisher under `/sims/publisher`, the streaming
/// WebSocket at `/sims/streamer/events`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sims/hub/connect", post(http::hub::connect))
        .route("/sims/hub/heartbeat", post(http::hub::heartbeat))
        .route("/sims/hub/disconnect", post(http::hub::disconnect))
        .route("/sims/hub/list", get(http::hub::list))
        .route("/sims/publisher/unicast", post(http::publisher::unicast))
        .route("/sims/publisher/multicast", post(http::publisher::multicast))
        .route("/sims/streamer/events", get(ws_events::events_handler))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
