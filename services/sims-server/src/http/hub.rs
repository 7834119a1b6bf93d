//! Hub routes: `POST /sims/hub/{connect,heartbeat,disconnect}`,
//! `GET /sims/hub/list`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use sims_core::Hub;
use sims_protocol::{ConnectRequest, DisconnectRequest, HeartbeatRequest, ListResponse};

use crate::http::response::error_response;
use crate::state::AppState;

pub async fn connect(State(state): State<AppState>, Json(req): Json<ConnectRequest>) -> impl IntoResponse {
    match Hub::new(&state.registry).connect(req.header.as_ref()) {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn heartbeat(State(state): State<AppState>, Json(req): Json<HeartbeatRequest>) -> impl IntoResponse {
    match Hub::new(&state.registry).heartbeat(req.header.as_ref()) {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn disconnect(State(state): State<AppState>, Json(req): Json<DisconnectRequest>) -> impl IntoResponse {
    match Hub::new(&state.registry).disconnect(req.header.as_ref()) {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    let channels = Hub::new(&state.registry).list();
    Json(ListResponse { channels })
}
