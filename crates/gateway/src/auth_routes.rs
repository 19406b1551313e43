//! `/api/auth` routes: login and token refresh.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};

use wheelhouse_identity::LoginOutcome;

use crate::{error::identity_error, state::AppState};

pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
}

fn outcome_response(outcome: LoginOutcome) -> Response {
    Json(serde_json::json!({
        "subject_id": outcome.subject_id,
        "token": outcome.token,
        "expires_at": outcome.expires_at,
    }))
    .into_response()
}

// ── Login ────────────────────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    match state.identity.login(&body.email, &body.password).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => identity_error(e),
    }
}

// ── Refresh ──────────────────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct RefreshRequest {
    token: String,
}

async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> impl IntoResponse {
    match state.identity.refresh(&body.token).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => identity_error(e),
    }
}
