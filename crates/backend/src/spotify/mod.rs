//! Spotify integration: OAuth linking, token refresh and player control.

mod client;
mod playback;
mod refresher;

use thiserror::Error;

pub use client::{SpotifyClient, SpotifyProfile, TokenGrant, SCOPES};
pub use playback::{PlaybackCommand, PlaybackRelay};
pub use refresher::TokenRefresher;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("request to Spotify failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Spotify did not return a refresh token")]
    MissingRefreshToken,

    #[error("Spotify returned an unusable token lifetime: {0}s")]
    InvalidExpiry(i64),

    #[error("account storage failed: {0}")]
    Store(#[source] anyhow::Error),
}
