//! `/api/files` routes: stored content serving and removal.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::{auth::AuthSubject, error::media_error, state::AppState};

pub fn file_router() -> axum::Router<AppState> {
    axum::Router::new().route("/{reference}", get(serve_handler).delete(delete_handler))
}

/// Serving is unauthenticated so image references can be used directly in
/// `<img>` tags; references are unguessable uuids.
async fn serve_handler(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    match state.content.open(&reference).await {
        Ok(content) => {
            ([(header::CONTENT_TYPE, content.content_type)], content.data).into_response()
        },
        Err(e) => media_error(e),
    }
}

async fn delete_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    match state.content.delete(&reference).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => media_error(e),
    }
}
