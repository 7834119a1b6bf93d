//! The `GET /sims/streamer/events` WebSocket handler (C4's transport
//! binding). Handshake-then-loop shape adapted from this codebase's
//! forwarder socket handler: the first frame must be an `EventsRequest`,
//! after which the connection becomes a pure server-push feed until the
//! channel is torn down or the client disconnects.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use sims_core::Streamer;
use sims_protocol::EventsRequest;
use tracing::{info, warn};

use crate::state::AppState;
use crate::ws_common::{recv_text_with_timeout, send_ws_error};

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn events_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_socket(socket, state))
}

async fn handle_events_socket(mut socket: WebSocket, state: AppState) {
    let hello_text = match recv_text_with_timeout(&mut socket, HELLO_TIMEOUT).await {
        Ok(text) => text,
        Err(()) => {
            send_ws_error(&mut socket, "ERR_UNSPECIFIED", "timed out waiting for events_request").await;
            return;
        }
    };

    let request: EventsRequest = match serde_json::from_str(&hello_text) {
        Ok(req) => req,
        Err(err) => {
            send_ws_error(&mut socket, "ERR_UNSPECIFIED", &format!("invalid events_request: {err}")).await;
            return;
        }
    };

    let streamer = Streamer::new(&state.registry);
    let stream = match streamer.events(request.header.as_ref()) {
        Ok(stream) => stream,
        Err(err) => {
            send_ws_error(&mut socket, err.code().as_str(), &err.to_string()).await;
            return;
        }
    };

    let user_id = request
        .header
        .as_ref()
        .map(|h| h.user_id.clone())
        .unwrap_or_default();
    info!(user_id = %user_id, "events stream opened");

    loop {
        tokio::select! {
            event = stream.recv() => {
                match event {
                    Some(event) => {
                        let Ok(json) = serde_json::to_string(&event) else { continue };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        info!(user_id = %user_id, "channel torn down, ending stream");
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        info!(user_id = %user_id, "client closed events stream");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    Some(Err(err)) => {
                        warn!(user_id = %user_id, error = %err, "WS error on events stream");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
}
