use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::auth;
use crate::error::ApiError;
use crate::handlers::{accounts, health, playback};
use crate::AppState;

pub fn app_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health::health_check))

        // Google login
        .route("/google/login", get(auth::google_login))
        .route("/google/callback", get(auth::google_callback))
        .route("/google/me", get(auth::session_me))
        .route("/google/logout", post(auth::session_logout))

        // Spotify account linking
        .route("/auth/login", get(accounts::spotify_login))
        .route("/auth/callback", get(accounts::spotify_callback))
        .route("/auth/accounts", get(accounts::list_accounts))
        .route("/auth/accounts/reorder", put(accounts::reorder_accounts))
        .route("/auth/accounts/:id", delete(accounts::delete_account))

        // Playback routes
        .route("/playback/:id/state", get(playback::get_state))
        .route("/playback/:id/play", put(playback::play))
        .route("/playback/:id/pause", put(playback::pause))
        .route("/playback/:id/volume", put(playback::set_volume))
        .route("/playback/:id/seek", put(playback::seek))
        .route("/playback/:id/next", post(playback::next_track))
        .route("/playback/:id/previous", post(playback::previous_track))
}

/// Fallback when no frontend build is being served.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route")
}
