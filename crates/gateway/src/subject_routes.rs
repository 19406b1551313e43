//! `/api/subjects` routes: registration and directory access.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use {wheelhouse_channels::SubjectView, wheelhouse_identity::NewSubject};

use crate::{
    auth::AuthSubject,
    error::{identity_error, internal_error},
    state::AppState,
};

pub fn subject_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(register_handler).get(list_handler))
        .route("/me", get(me_handler))
        .route("/{id}/activate", post(activate_handler))
        .route("/{id}/deactivate", post(deactivate_handler))
}

// ── Registration ─────────────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct RegisterRequest {
    name: String,
    surname: String,
    email: String,
    phone: Option<String>,
    password: String,
}

/// Registration is the one unauthenticated subject route.
async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> impl IntoResponse {
    let new = NewSubject {
        name: body.name,
        surname: body.surname,
        email: body.email,
        phone: body.phone,
        password: body.password,
    };
    match state.identity.register(new).await {
        Ok(subject) => (StatusCode::CREATED, Json(SubjectView::from(&subject))).into_response(),
        Err(e) => identity_error(e),
    }
}

// ── Directory ────────────────────────────────────────────────────────────────

async fn list_handler(_subject: AuthSubject, State(state): State<AppState>) -> impl IntoResponse {
    match state.identity.subjects().list().await {
        Ok(subjects) => {
            let views: Vec<SubjectView> = subjects.iter().map(SubjectView::from).collect();
            Json(views).into_response()
        },
        Err(e) => internal_error(e),
    }
}

async fn me_handler(
    AuthSubject(subject_id): AuthSubject,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.identity.profile(&subject_id).await {
        Ok(subject) => Json(SubjectView::from(&subject)).into_response(),
        Err(e) => identity_error(e),
    }
}

// ── Activation ───────────────────────────────────────────────────────────────

async fn activate_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.identity.set_active(&id, true).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => identity_error(e),
    }
}

async fn deactivate_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.identity.set_active(&id, false).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => identity_error(e),
    }
}
