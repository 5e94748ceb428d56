use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Linked Spotify account, matching database column order exactly.
///
/// Carries the OAuth credentials, so it never leaves the backend as-is;
/// use [`AccountResponse`] for API output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Account {
    pub id: Uuid,
    pub spotify_user_id: String,
    pub display_name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub sort_order: i32,
}

impl Account {
    /// Whether the stored access token can still be used at `now`.
    pub fn token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at > now
    }
}

// API Request/Response types for account management
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub spotify_user_id: String,
    pub display_name: String,
    pub sort_order: i32,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id,
            spotify_user_id: account.spotify_user_id,
            display_name: account.display_name,
            sort_order: account.sort_order,
        }
    }
}

/// Current player state for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_image_url: Option<String>,
    #[serde(default)]
    pub progress_ms: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

impl PlaybackState {
    /// Nothing is playing (or no device is active).
    pub fn idle() -> Self {
        Self::default()
    }
}

// Auth API types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUserResponse {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
