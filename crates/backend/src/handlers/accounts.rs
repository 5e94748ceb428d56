use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;
use shared_types::{AccountResponse, OkResponse};
use uuid::Uuid;

use crate::auth::session_token;
use crate::error::{ApiError, ApiResult};
use crate::models::NewAccount;
use crate::spotify::SpotifyError;
use crate::AppState;

/// Start linking a Spotify account.
///
/// The caller's session token rides along in `state` so the callback can
/// authenticate even when the browser does not send the cookie back.
pub async fn spotify_login(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    let token = session_token(&headers).unwrap_or_default();
    Redirect::to(&state.spotify.authorize_url(&token))
}

#[derive(Debug, Deserialize)]
pub struct SpotifyCallbackParams {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Finish linking: exchange the code, look up the profile and store the account.
pub async fn spotify_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SpotifyCallbackParams>,
) -> ApiResult<Redirect> {
    let token = session_token(&headers)
        .or_else(|| params.state.clone().filter(|s| !s.is_empty()))
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let email = state
        .sessions
        .verify(&token)
        .filter(|email| state.allowlist.is_allowed(email))
        .ok_or_else(|| ApiError::Forbidden("Invalid session".to_string()))?;

    let grant = state
        .spotify
        .exchange_code(&params.code)
        .await
        .map_err(|e| {
            tracing::error!("Spotify token exchange failed: {}", e);
            ApiError::upstream("Failed to exchange code")
        })?;

    let refresh_token = grant
        .refresh_token
        .clone()
        .ok_or(SpotifyError::MissingRefreshToken)?;

    let profile = state
        .spotify
        .profile(&grant.access_token)
        .await
        .map_err(|e| {
            tracing::error!("Spotify profile fetch failed: {}", e);
            ApiError::upstream("Failed to fetch Spotify profile")
        })?;

    let account = state
        .accounts
        .upsert(NewAccount {
            spotify_user_id: profile.id.clone(),
            display_name: profile.label(),
            access_token: grant.access_token.clone(),
            refresh_token,
            token_expires_at: grant.expires_at(Utc::now())?,
        })
        .await?;

    tracing::info!(
        "{} linked Spotify account {} ({})",
        email,
        account.display_name,
        account.spotify_user_id
    );

    Ok(Redirect::to(&state.config.frontend_url))
}

pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<Vec<AccountResponse>>> {
    let accounts = state.accounts.list().await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

pub async fn reorder_accounts(
    State(state): State<AppState>,
    Json(ordered_ids): Json<Vec<Uuid>>,
) -> ApiResult<Json<OkResponse>> {
    state.accounts.reorder(&ordered_ids).await?;

    Ok(Json(OkResponse::ok()))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    if !state.accounts.delete(account_id).await? {
        return Err(ApiError::not_found("Account"));
    }

    tracing::info!("Removed account {}", account_id);
    Ok(Json(OkResponse::ok()))
}
