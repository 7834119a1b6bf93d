//! Publisher routes: `POST /sims/publisher/{unicast,multicast}`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use sims_core::Publisher;
use sims_protocol::{MulticastRequest, UnicastRequest};

use crate::http::response::error_response;
use crate::state::AppState;

pub async fn unicast(State(state): State<AppState>, Json(req): Json<UnicastRequest>) -> impl IntoResponse {
    match Publisher::new(&state.registry).unicast(&req.user_id, req.event, req.user_selector) {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn multicast(State(state): State<AppState>, Json(req): Json<MulticastRequest>) -> impl IntoResponse {
    match Publisher::new(&state.registry).multicast(&req.user_ids, req.event, req.user_selector) {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use sims_core::{Hub, Registry, RegistryConfig};
    use sims_protocol::{Event, EventKind, Header, MulticastResponse};
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(Registry::new(RegistryConfig::default())))
    }

    #[tokio::test]
    async fn unicast_with_no_reader_is_conflict() {
        let app_state = state();
        Hub::new(&app_state.registry)
            .connect(Some(&Header {
                user_id: "alice".to_owned(),
                request_id: None,
            }))
            .unwrap();
        let response = unicast(
            State(app_state),
            Json(UnicastRequest {
                user_id: "alice".to_owned(),
                event: Some(Event {
                    kind: EventKind::text(),
                    data: b"hi".to_vec(),
                    selector: None,
                }),
                user_selector: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn multicast_with_no_recipients_is_bad_request() {
        let response = multicast(
            State(state()),
            Json(MulticastRequest {
                user_ids: vec![],
                event: Some(Event {
                    kind: EventKind::text(),
                    data: vec![],
                    selector: None,
                }),
                user_selector: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multicast_reports_per_recipient_errors_in_body() {
        let response = multicast(
            State(state()),
            Json(MulticastRequest {
                user_ids: vec!["ghost".to_owned()],
                event: Some(Event {
                    kind: EventKind::text(),
                    data: vec![],
                    selector: None,
                }),
                user_selector: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: MulticastResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.user_errcode["ghost"], sims_protocol::ErrorCode::NotFound);
    }
}
