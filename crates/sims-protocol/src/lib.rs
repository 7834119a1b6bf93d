// sims-protocol: wire types and the error taxonomy shared by every SIMS
// transport binding (JSON-over-HTTP, binary-framed RPC) and by sims-core.
//
// Types here carry no transport-specific behavior -- no axum, no tokio.
// They exist to give every binding the same request/response shapes and the
// same stable error identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Header / identity
// ---------------------------------------------------------------------------

/// Carried by every unary Hub/Streamer request. `request_id` is opaque and
/// used only for log correlation -- the registry never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Header {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An event kind. `HEARTBEAT` is reserved for server-internal liveness
/// probes; callers of Publisher.Unicast/Multicast supplying it are rejected
/// with `ErrorCode::InvalidEventType`. Unlike the original proto's closed
/// enum, this is an open string so new domain event kinds don't need a
/// protocol recompile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKind(pub String);

impl EventKind {
    pub const HEARTBEAT: &'static str = "HEARTBEAT";
    pub const TEXT: &'static str = "TEXT";

    pub fn heartbeat() -> Self {
        EventKind(Self::HEARTBEAT.to_owned())
    }

    pub fn text() -> Self {
        EventKind(Self::TEXT.to_owned())
    }

    pub fn is_heartbeat(&self) -> bool {
        self.0 == Self::HEARTBEAT
    }
}

/// A single routed event. `selector` carries the opaque per-recipient
/// context a Multicast caller attached via `user_selector` (spec.md Open
/// Question: treated as opaque, passed through unchanged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<serde_json::Value>,
}

impl Event {
    pub fn heartbeat() -> Self {
        Event {
            kind: EventKind::heartbeat(),
            data: Vec::new(),
            selector: None,
        }
    }
}

/// `data` rides inside JSON as base64 text, the same way binary reader
/// payloads are carried through this codebase's other JSON wire messages.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hub requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectRequest {
    #[serde(default)]
    pub header: Option<Header>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub header: Option<Header>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisconnectRequest {
    #[serde(default)]
    pub header: Option<Header>,
}

/// One entry in `List`'s snapshot, sorted descending by `last_heartbeat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub user_id: String,
    pub birth: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub active: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListResponse {
    pub channels: Vec<ChannelInfo>,
}

// ---------------------------------------------------------------------------
// Streamer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventsRequest {
    #[serde(default)]
    pub header: Option<Header>,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnicastRequest {
    pub user_id: String,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_selector: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnicastResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MulticastRequest {
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub event: Option<Event>,
    /// Per-recipient opaque context, keyed by `user_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_selector: Option<std::collections::HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MulticastResponse {
    pub user_errcode: std::collections::HashMap<String, ErrorCode>,
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Stable wire identifiers. The name is the contract -- do not renumber or
/// rename a variant without treating it as a breaking protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "ERR_MISSING_HEADER")]
    MissingHeader,
    #[serde(rename = "ERR_MISSING_USERID")]
    MissingUserId,
    #[serde(rename = "ERR_NOT_FOUND")]
    NotFound,
    #[serde(rename = "ERR_NO_CONSUMER")]
    NoConsumer,
    #[serde(rename = "ERR_MISSING_EVENT")]
    MissingEvent,
    #[serde(rename = "ERR_INVALID_EVENT_TYPE")]
    InvalidEventType,
    #[serde(rename = "ERR_UNSPECIFIED")]
    Unspecified,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingHeader => "ERR_MISSING_HEADER",
            ErrorCode::MissingUserId => "ERR_MISSING_USERID",
            ErrorCode::NotFound => "ERR_NOT_FOUND",
            ErrorCode::NoConsumer => "ERR_NO_CONSUMER",
            ErrorCode::MissingEvent => "ERR_MISSING_EVENT",
            ErrorCode::InvalidEventType => "ERR_INVALID_EVENT_TYPE",
            ErrorCode::Unspecified => "ERR_UNSPECIFIED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type every SIMS API surface returns. Unary operations return
/// the first error encountered; Multicast instead collects one per
/// recipient into `MulticastResponse::user_errcode` and always returns Ok.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimsError {
    #[error("no header present on request")]
    MissingHeader,
    #[error("header user_id is empty")]
    MissingUserId,
    #[error("no channel for this user on this node")]
    NotFound,
    #[error("channel exists but no stream is draining it")]
    NoConsumer,
    #[error("request carried no event")]
    MissingEvent,
    #[error("event type must not be HEARTBEAT")]
    InvalidEventType,
    #[error("unspecified failure")]
    Unspecified,
}

impl SimsError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SimsError::MissingHeader => ErrorCode::MissingHeader,
            SimsError::MissingUserId => ErrorCode::MissingUserId,
            SimsError::NotFound => ErrorCode::NotFound,
            SimsError::NoConsumer => ErrorCode::NoConsumer,
            SimsError::MissingEvent => ErrorCode::MissingEvent,
            SimsError::InvalidEventType => ErrorCode::InvalidEventType,
            SimsError::Unspecified => ErrorCode::Unspecified,
        }
    }
}

/// Frozen HTTP error envelope used by every non-2xx JSON transport response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&SimsError> for HttpErrorEnvelope {
    fn from(err: &SimsError) -> Self {
        HttpErrorEnvelope {
            code: err.code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_serializes_to_frozen_wire_string() {
        let json = serde_json::to_string(&ErrorCode::NoConsumer).unwrap();
        assert_eq!(json, "\"ERR_NO_CONSUMER\"");
    }

    #[test]
    fn event_kind_heartbeat_is_recognized() {
        assert!(EventKind::heartbeat().is_heartbeat());
        assert!(!EventKind::text().is_heartbeat());
    }

    #[test]
    fn event_data_round_trips_through_json() {
        let event = Event {
            kind: EventKind::text(),
            data: vec![0, 1, 2, 253, 254, 255],
            selector: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn connect_request_with_missing_header_deserializes_to_none() {
        let req: ConnectRequest = serde_json::from_str("{}").unwrap();
        assert!(req.header.is_none());
    }

    #[test]
    fn http_error_envelope_carries_stable_code_string() {
        let envelope = HttpErrorEnvelope::from(&SimsError::NotFound);
        assert_eq!(envelope.code, "ERR_NOT_FOUND");
    }
}
