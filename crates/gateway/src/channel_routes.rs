//! `/api/channels` routes: lifecycle, projection, and membership-scoped
//! listing.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use base64::{Engine, engine::general_purpose::STANDARD};

use wheelhouse_channels::{CreateChannel, EditChannel, ImageUpload};

use crate::{
    auth::AuthSubject,
    error::{bad_request, channel_error},
    state::AppState,
};

pub fn channel_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_handler).get(list_mine_handler))
        .route(
            "/{id}",
            get(get_handler).patch(edit_handler).delete(delete_handler),
        )
        .route("/subject/{subject_id}", get(list_for_subject_handler))
}

/// Image bytes travel as base64 inside the JSON body.
#[derive(serde::Deserialize)]
struct ImagePayload {
    data: String,
    content_type: String,
}

fn decode_image(payload: ImagePayload) -> Result<ImageUpload, Response> {
    match STANDARD.decode(payload.data.as_bytes()) {
        Ok(bytes) => Ok(ImageUpload {
            bytes,
            content_type: payload.content_type,
        }),
        Err(_) => Err(bad_request("image data is not valid base64")),
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct CreateChannelRequest {
    name: String,
    description: Option<String>,
    #[serde(default)]
    member_ids: Vec<String>,
    image: Option<ImagePayload>,
}

async fn create_handler(
    AuthSubject(creator_id): AuthSubject,
    State(state): State<AppState>,
    Json(body): Json<CreateChannelRequest>,
) -> impl IntoResponse {
    let image = match body.image.map(decode_image).transpose() {
        Ok(image) => image,
        Err(response) => return response,
    };
    let payload = CreateChannel {
        name: body.name,
        description: body.description,
        member_ids: body.member_ids,
        image,
    };
    match state.channels.create(&creator_id, payload).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => channel_error(e),
    }
}

// ── Read ─────────────────────────────────────────────────────────────────────

async fn get_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.channels.get(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => channel_error(e),
    }
}

/// Channels of the calling subject.
async fn list_mine_handler(
    AuthSubject(subject_id): AuthSubject,
    State(state): State<AppState>,
) -> impl IntoResponse {
    list_for(&state, &subject_id).await
}

/// Channels of an explicitly named subject.
async fn list_for_subject_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> impl IntoResponse {
    list_for(&state, &subject_id).await
}

async fn list_for(state: &AppState, subject_id: &str) -> Response {
    match state.channels.list_for_subject(subject_id).await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(e) => channel_error(e),
    }
}

// ── Edit ─────────────────────────────────────────────────────────────────────

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct EditChannelRequest {
    name: Option<String>,
    description: Option<String>,
    image: Option<ImagePayload>,
}

async fn edit_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EditChannelRequest>,
) -> impl IntoResponse {
    let image = match body.image.map(decode_image).transpose() {
        Ok(image) => image,
        Err(response) => return response,
    };
    let payload = EditChannel {
        name: body.name,
        description: body.description,
        image,
    };
    match state.channels.edit(&id, payload).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => channel_error(e),
    }
}

// ── Delete ───────────────────────────────────────────────────────────────────

async fn delete_handler(
    _subject: AuthSubject,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.channels.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => channel_error(e),
    }
}
