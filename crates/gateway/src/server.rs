//! Server startup and router assembly.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    axum::{Json, Router, extract::DefaultBodyLimit, routing::get},
    secrecy::ExposeSecret,
    tower_http::cors::{Any, CorsLayer},
    tracing::{info, warn},
};

use {
    wheelhouse_channels::{ChannelService, SqliteChannelStore},
    wheelhouse_config::WheelhouseConfig,
    wheelhouse_identity::{Identity, SqliteSubjectStore, TokenSigner},
    wheelhouse_media::{ContentStore, FsContentStore},
};

use crate::{
    auth_routes::auth_router, channel_routes::channel_router, file_routes::file_router,
    seed::seed_first_subject, state::AppState, subject_routes::subject_router,
};

/// Request bodies carry base64-encoded images, so the limit sits above the
/// raw content-store maximum to leave room for the encoding overhead.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the API router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", auth_router())
        .nest("/api/subjects", subject_router())
        .nest("/api/channels", channel_router())
        .nest("/api/files", file_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── Wiring ───────────────────────────────────────────────────────────────────

/// Assemble the application state on top of a database pool and an uploads
/// directory. Creates the schema if it does not exist yet.
pub async fn build_state(
    pool: sqlx::SqlitePool,
    uploads_dir: PathBuf,
    config: &WheelhouseConfig,
) -> anyhow::Result<AppState> {
    SqliteSubjectStore::init(&pool)
        .await
        .context("init subjects schema")?;
    SqliteChannelStore::init(&pool)
        .await
        .context("init channels schema")?;

    let signer = match &config.auth.token_secret {
        Some(secret) => TokenSigner::new(
            secret.expose_secret().as_bytes().to_vec(),
            config.auth.token_ttl_secs,
        ),
        None => {
            warn!("no [auth] token_secret configured; tokens will not survive a restart");
            TokenSigner::ephemeral(config.auth.token_ttl_secs)
        },
    };

    let subjects = Arc::new(SqliteSubjectStore::new(pool.clone()));
    let identity = Arc::new(Identity::new(subjects.clone(), signer));
    let content: Arc<dyn ContentStore> = Arc::new(FsContentStore::new(uploads_dir));
    let channels = Arc::new(ChannelService::new(
        Arc::new(SqliteChannelStore::new(pool)),
        subjects,
        Arc::clone(&content),
    ));

    Ok(AppState {
        identity,
        channels,
        content,
    })
}

// ── Startup ──────────────────────────────────────────────────────────────────

/// Start the HTTP server: open the database, seed on first run, bind, serve.
pub async fn start_gateway(bind: &str, port: u16) -> anyhow::Result<()> {
    let config = wheelhouse_config::discover_and_load();

    let data_dir = wheelhouse_config::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    let db_path = wheelhouse_config::database_path();
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = sqlx::SqlitePool::connect(&db_url)
        .await
        .with_context(|| format!("open database {}", db_path.display()))?;

    let state = build_state(pool, wheelhouse_config::uploads_dir(), &config).await?;
    seed_first_subject(&state.identity, &config.seed).await?;

    let app = build_app(state);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
