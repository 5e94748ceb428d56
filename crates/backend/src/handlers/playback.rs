use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;
use shared_types::{Account, OkResponse, PlaybackState};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::spotify::PlaybackCommand;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct VolumeParams {
    #[validate(range(min = 0, max = 100))]
    pub level: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SeekParams {
    #[validate(range(min = 0))]
    pub position_ms: i64,
}

async fn load_account(state: &AppState, account_id: Uuid) -> ApiResult<Account> {
    state
        .accounts
        .get(account_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))
}

async fn dispatch(
    state: &AppState,
    account_id: Uuid,
    command: PlaybackCommand,
) -> ApiResult<Json<OkResponse>> {
    let account = load_account(state, account_id).await?;

    state
        .playback
        .send_command(&account, command)
        .await
        .inspect_err(|e| {
            tracing::error!(
                "{:?} failed for Spotify user {}: {}",
                command,
                account.spotify_user_id,
                e
            )
        })?;

    Ok(Json(OkResponse::ok()))
}

pub async fn get_state(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<PlaybackState>> {
    let account = load_account(&state, account_id).await?;

    let playback = state.playback.playback_state(&account).await.inspect_err(|e| {
        tracing::error!(
            "Fetching playback state failed for Spotify user {}: {}",
            account.spotify_user_id,
            e
        )
    })?;

    Ok(Json(playback))
}

pub async fn play(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    dispatch(&state, account_id, PlaybackCommand::Play).await
}

pub async fn pause(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    dispatch(&state, account_id, PlaybackCommand::Pause).await
}

pub async fn set_volume(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<VolumeParams>,
) -> ApiResult<Json<OkResponse>> {
    params.validate()?;

    dispatch(&state, account_id, PlaybackCommand::Volume(params.level as u8)).await
}

pub async fn seek(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<SeekParams>,
) -> ApiResult<Json<OkResponse>> {
    params.validate()?;

    dispatch(&state, account_id, PlaybackCommand::Seek(params.position_ms as u64)).await
}

pub async fn next_track(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    dispatch(&state, account_id, PlaybackCommand::Next).await
}

pub async fn previous_track(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    dispatch(&state, account_id, PlaybackCommand::Previous).await
}
