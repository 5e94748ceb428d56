use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use shared_types::{Account, PlaybackState};

use super::client::ensure_success;
use super::{SpotifyClient, SpotifyError, TokenRefresher};

/// Transport commands accepted by the Spotify player endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    /// Volume in percent, 0..=100.
    Volume(u8),
    /// Position in milliseconds.
    Seek(u64),
    Next,
    Previous,
}

impl PlaybackCommand {
    fn method(&self) -> Method {
        match self {
            PlaybackCommand::Next | PlaybackCommand::Previous => Method::POST,
            _ => Method::PUT,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            PlaybackCommand::Play => "/play",
            PlaybackCommand::Pause => "/pause",
            PlaybackCommand::Volume(_) => "/volume",
            PlaybackCommand::Seek(_) => "/seek",
            PlaybackCommand::Next => "/next",
            PlaybackCommand::Previous => "/previous",
        }
    }

    fn query(&self) -> Option<(&'static str, String)> {
        match self {
            PlaybackCommand::Volume(level) => Some(("volume_percent", level.to_string())),
            PlaybackCommand::Seek(position) => Some(("position_ms", position.to_string())),
            _ => None,
        }
    }
}

/// Spotify answers 202/204 for accepted commands and 403 when no device is
/// active or the account is not premium. None of these are caller errors.
fn is_soft_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::FORBIDDEN
}

/// Forwards player commands for a linked account.
#[derive(Clone)]
pub struct PlaybackRelay {
    refresher: Arc<TokenRefresher>,
    spotify: SpotifyClient,
}

impl PlaybackRelay {
    pub fn new(refresher: Arc<TokenRefresher>, spotify: SpotifyClient) -> Self {
        Self { refresher, spotify }
    }

    pub async fn send_command(
        &self,
        account: &Account,
        command: PlaybackCommand,
    ) -> Result<(), SpotifyError> {
        let token = self.refresher.ensure_valid_access_token(account).await?;

        let mut request = self
            .spotify
            .player_request(command.method(), command.path(), &token);
        if let Some(param) = command.query() {
            request = request.query(&[param]);
        }

        let response = request.header(reqwest::header::CONTENT_LENGTH, 0).send().await?;
        let status = response.status();
        if is_soft_success(status) {
            if status == StatusCode::FORBIDDEN {
                tracing::debug!(
                    "Spotify rejected {:?} for {} with 403; treating as no-op",
                    command,
                    account.spotify_user_id
                );
            }
            return Ok(());
        }

        ensure_success(response).await.map(|_| ())
    }

    pub async fn playback_state(&self, account: &Account) -> Result<PlaybackState, SpotifyError> {
        let token = self.refresher.ensure_valid_access_token(account).await?;

        let response = self
            .spotify
            .player_request(Method::GET, "", &token)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::NO_CONTENT | StatusCode::ACCEPTED) {
            return Ok(PlaybackState::idle());
        }

        let player: PlayerResponse = ensure_success(response).await?.json().await?;
        Ok(player.into())
    }
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    item: Option<PlayerItem>,
    #[serde(default)]
    device: Option<PlayerDevice>,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    artists: Vec<NamedEntity>,
    #[serde(default)]
    album: Option<PlayerAlbum>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerAlbum {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    images: Vec<AlbumImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PlayerDevice {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    volume_percent: Option<u8>,
}

impl From<PlayerResponse> for PlaybackState {
    fn from(player: PlayerResponse) -> Self {
        let (device_name, volume_percent) = player
            .device
            .map(|d| (d.name, d.volume_percent))
            .unwrap_or_default();

        let mut state = PlaybackState {
            is_playing: player.is_playing,
            progress_ms: player.progress_ms.unwrap_or(0),
            device_name,
            volume_percent,
            ..PlaybackState::idle()
        };

        if let Some(item) = player.item {
            let artists: Vec<_> = item.artists.into_iter().map(|a| a.name).collect();
            state.track_name = item.name;
            state.duration_ms = item.duration_ms.unwrap_or(0);
            state.artist_name = (!artists.is_empty()).then(|| artists.join(", "));
            if let Some(album) = item.album {
                state.album_image_url = album.images.into_iter().next().map(|i| i.url);
                state.album_name = album.name;
            }
        }

        state
    }
}
