//! Small WebSocket helpers shared by the events handler: sending a JSON
//! error frame and reading one text frame under a deadline. Adapted from
//! this codebase's forwarder/receiver WS handling, minus the bearer-token
//! plumbing (SIMS has no authentication layer, see SPEC_FULL.md §10).

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use sims_protocol::HttpErrorEnvelope;

pub async fn send_ws_error(socket: &mut WebSocket, code: &str, message: &str) {
    let envelope = HttpErrorEnvelope {
        code: code.to_owned(),
        message: message.to_owned(),
        details: None,
    };
    if let Ok(json) = serde_json::to_string(&envelope) {
        let _ = socket.send(Message::Text(json.into())).await;
    }
}

fn parse_text_message(msg: Option<Result<Message, axum::Error>>) -> Result<String, ()> {
    match msg {
        Some(Ok(Message::Text(text))) => Ok(text.to_string()),
        _ => Err(()),
    }
}

pub async fn recv_text_with_timeout(socket: &mut WebSocket, timeout: Duration) -> Result<String, ()> {
    match tokio::time::timeout(timeout, socket.recv()).await {
        Ok(msg) => parse_text_message(msg),
        Err(_) => Err(()),
    }
}
