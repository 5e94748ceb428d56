//! Backend for a small control panel that links several Spotify accounts,
//! gates access behind Google login plus an email allowlist, and relays
//! playback commands to the Spotify Web API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
mod routes;
pub mod schema;
pub mod spotify;

#[cfg(test)]
mod test_support;

use auth::{Allowlist, GoogleClient, GoogleEndpoints, SessionCodec};
use config::AppConfig;
use repository::AccountStore;
use spotify::{PlaybackRelay, SpotifyClient, TokenRefresher};

/// Shared application state handed to every handler and the auth middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionCodec>,
    pub allowlist: Arc<Allowlist>,
    pub accounts: Arc<dyn AccountStore>,
    pub spotify: SpotifyClient,
    pub google: GoogleClient,
    pub playback: PlaybackRelay,
}

impl AppState {
    /// Production wiring: allowlist from disk, Google's public endpoints.
    pub fn new(config: AppConfig, accounts: Arc<dyn AccountStore>) -> anyhow::Result<Self> {
        let allowlist = Allowlist::load(config.allowlist_path.as_deref());
        Self::with_parts(config, accounts, allowlist, GoogleEndpoints::default())
    }

    pub fn with_parts(
        config: AppConfig,
        accounts: Arc<dyn AccountStore>,
        allowlist: Allowlist,
        google_endpoints: GoogleEndpoints,
    ) -> anyhow::Result<Self> {
        let http = config
            .http
            .build_client()
            .context("Failed to build HTTP client")?;

        let spotify = SpotifyClient::new(http.clone(), config.spotify.clone());
        let google = GoogleClient::new(http, config.google.clone(), google_endpoints);
        let refresher = Arc::new(TokenRefresher::new(accounts.clone(), spotify.clone()));
        let playback = PlaybackRelay::new(refresher, spotify.clone());

        Ok(Self {
            sessions: Arc::new(SessionCodec::new(&config.session_secret)),
            allowlist: Arc::new(allowlist),
            config: Arc::new(config),
            accounts,
            spotify,
            google,
            playback,
        })
    }
}

/// Full HTTP surface: API routes, static frontend fallback, session gate,
/// CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let frontend_dir = state.config.frontend_dir.clone();

    // Serve static frontend files if the directory exists
    let app = if frontend_dir.exists() {
        tracing::info!("Serving frontend from {}", frontend_dir.display());
        let index_path = frontend_dir.join("index.html");
        let serve_dir = ServeDir::new(&frontend_dir).not_found_service(ServeFile::new(index_path));
        routes::app_routes().fallback_service(serve_dir)
    } else {
        tracing::info!(
            "Frontend directory not found at {}, serving API only",
            frontend_dir.display()
        );
        routes::app_routes().fallback(routes::not_found)
    };

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_session,
    ))
    .layer(build_cors_layer(&state.config.frontend_url))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// CORS for the frontend origin, with credentials so the session cookie is sent.
///
/// Falls back to permissive CORS if `FRONTEND_URL` is not a valid header value.
fn build_cors_layer(frontend_url: &str) -> CorsLayer {
    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => {
            tracing::info!("CORS configured for origin: {}", frontend_url);
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
        Err(_) => {
            tracing::warn!(
                "FRONTEND_URL is not a valid origin, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
