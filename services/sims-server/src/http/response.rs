use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use sims_protocol::{HttpErrorEnvelope, SimsError};

pub type HttpResponse = Response;

/// Maps the error taxonomy to the status codes an HTTP client reasonably
/// expects: malformed/missing input is a client error, a channel that
/// doesn't exist is 404, a channel nobody is draining is 409 (the request
/// was well-formed but cannot be satisfied right now), and the catch-all is
/// a 500.
pub fn error_response(err: &SimsError) -> HttpResponse {
    let status = match err {
        SimsError::MissingHeader
        | SimsError::MissingUserId
        | SimsError::MissingEvent
        | SimsError::InvalidEventType => StatusCode::BAD_REQUEST,
        SimsError::NotFound => StatusCode::NOT_FOUND,
        SimsError::NoConsumer => StatusCode::CONFLICT,
        SimsError::Unspecified => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(HttpErrorEnvelope::from(err))).into_response()
}
