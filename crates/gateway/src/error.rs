//! Mapping from domain errors to HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`. Unexpected
//! failures are logged and surface as a generic 500 so internals never leak
//! into responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Build a JSON error response with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Log the underlying error and answer with a generic 500.
pub fn internal_error(err: impl std::fmt::Display) -> Response {
    error!(error = %err, "request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

pub fn identity_error(err: wheelhouse_identity::Error) -> Response {
    use wheelhouse_identity::Error;

    match &err {
        Error::InvalidInput { .. } | Error::EmailTaken { .. } => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        },
        Error::Unauthorized { .. } => error_response(StatusCode::UNAUTHORIZED, err.to_string()),
        Error::UnknownSubject { .. } => error_response(StatusCode::NOT_FOUND, err.to_string()),
        _ => internal_error(err),
    }
}

pub fn channel_error(err: wheelhouse_channels::Error) -> Response {
    use wheelhouse_channels::Error;

    match &err {
        Error::InvalidInput { .. } => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        Error::UnknownChannel { .. } | Error::UnknownSubject { .. } => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        },
        Error::External { .. } => internal_error(err),
    }
}

pub fn media_error(err: wheelhouse_media::Error) -> Response {
    if matches!(err, wheelhouse_media::Error::NotFound { .. }) {
        return error_response(StatusCode::NOT_FOUND, err.to_string());
    }
    if err.is_rejected_input() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    internal_error(err)
}
