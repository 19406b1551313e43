use std::sync::Arc;

use axum::extract::FromRef;

use {
    wheelhouse_channels::ChannelService, wheelhouse_identity::Identity,
    wheelhouse_media::ContentStore,
};

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<Identity>,
    pub channels: Arc<ChannelService>,
    pub content: Arc<dyn ContentStore>,
}

impl FromRef<AppState> for Arc<Identity> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.identity)
    }
}
