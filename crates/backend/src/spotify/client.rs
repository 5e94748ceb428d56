use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

use super::SpotifyError;
use crate::config::SpotifyConfig;

/// Scopes needed to read and drive the player.
pub const SCOPES: &str =
    "user-read-playback-state user-modify-playback-state user-read-currently-playing";

/// Result of a code or refresh-token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present when Spotify rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl TokenGrant {
    /// Absolute expiry of the access token, counted from `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SpotifyError> {
        TimeDelta::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(SpotifyError::InvalidExpiry(self.expires_in))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SpotifyProfile {
    /// Display name, or the user id when the profile has none.
    pub fn label(&self) -> String {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }
}

/// Thin client over the Spotify accounts service and Web API.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, config: SpotifyConfig) -> Self {
        Self { http, config }
    }

    /// Authorize URL for linking an account. `state` carries the caller's
    /// session token so the callback still authenticates when the cookie is
    /// scoped to a different hostname.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             response_type=code&\
             redirect_uri={}&\
             scope={}&\
             show_dialog=true&\
             state={}",
            self.config.accounts_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SpotifyError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, SpotifyError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    pub async fn profile(&self, access_token: &str) -> Result<SpotifyProfile, SpotifyError> {
        let response = self
            .http
            .get(format!("{}/me", self.config.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    /// Request against `/me/player{path}`, authorized with `access_token`.
    pub(crate) fn player_request(
        &self,
        method: Method,
        path: &str,
        access_token: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, format!("{}/me/player{}", self.config.api_url, path))
            .bearer_auth(access_token)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenGrant, SpotifyError> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = self
            .http
            .post(format!("{}/api/token", self.config.accounts_url))
            .form(&form)
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }
}

/// Turn any non-2xx response into [`SpotifyError::Status`], keeping the body.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SpotifyError::Status { status, body })
}
