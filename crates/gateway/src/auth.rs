//! Request authentication.
//!
//! Handlers that act on behalf of a subject take an [`AuthSubject`]
//! argument. The extractor resolves the `Authorization: Bearer` header to a
//! subject id and rejects the request with 401 otherwise; everything below
//! the HTTP layer then works with the plain id.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};

use wheelhouse_identity::{Identity, strip_bearer};

/// The authenticated subject id, resolved from the bearer token.
pub struct AuthSubject(pub String);

impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
    Arc<Identity>: FromRef<S>,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Arc::<Identity>::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let Some(token) = strip_bearer(header) else {
            return Err(unauthorized("missing bearer token"));
        };
        match identity.resolve_token(token) {
            Ok(subject_id) => Ok(AuthSubject(subject_id)),
            Err(_) => Err(unauthorized("invalid or expired token")),
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
}
