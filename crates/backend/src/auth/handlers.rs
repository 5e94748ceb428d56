//! Google login HTTP handlers.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Deserialize;
use shared_types::OkResponse;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::google::GoogleAuthError;
use super::middleware::{build_session_cookie, removal_cookie};
use super::types::{SessionUser, SessionUserResponse};

/// Start Google OAuth login flow.
pub async fn google_login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.google.authorize_url())
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackParams {
    pub code: String,
}

/// Handle Google OAuth callback.
///
/// Exchanges the authorization code, verifies the ID token, checks the email
/// against the allowlist and sets the session cookie on success.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<GoogleCallbackParams>,
) -> ApiResult<Response> {
    let id_token = state
        .google
        .exchange_code(&params.code)
        .await
        .map_err(|e| {
            tracing::error!("Google token exchange failed: {}", e);
            ApiError::upstream("Failed to exchange code")
        })?;

    let email = state
        .google
        .verify_id_token(&id_token)
        .await
        .map_err(|e| match e {
            GoogleAuthError::Http(e) => {
                ApiError::upstream(format!("Failed to fetch Google signing keys: {}", e))
            }
            other => {
                tracing::error!("ID token verification failed: {}", other);
                ApiError::Unauthorized("Invalid ID token".to_string())
            }
        })?;

    tracing::info!("Google login attempt from: {}", email);

    if !state.allowlist.is_allowed(&email) {
        tracing::warn!("Unauthorized login attempt from: {}", email);
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    let token = state
        .sessions
        .issue(&email)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create session: {}", e)))?;

    let secure = !state.google.config().is_local();
    let cookie = build_session_cookie(token, secure).to_string();

    tracing::info!("Successful login for: {}", email);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, state.config.frontend_url.as_str()),
            (header::SET_COOKIE, cookie.as_str()),
        ],
    )
        .into_response())
}

/// Get current authenticated user info.
pub async fn session_me(Extension(user): Extension<SessionUser>) -> Json<SessionUserResponse> {
    Json(SessionUserResponse { email: user.email })
}

/// Logout - clear session cookie.
pub async fn session_logout() -> impl IntoResponse {
    let cookie = removal_cookie().to_string();

    ([(header::SET_COOKIE, cookie)], Json(OkResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionCodec;
    use crate::repository::memory::MemoryAccountStore;
    use crate::test_support::{
        google_provider, signed_id_token, spawn_mock, test_state, TEST_SESSION_SECRET,
    };
    use axum::{routing::post, Router};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_redirects_to_google() {
        let state = test_state(
            Arc::new(MemoryAccountStore::default()),
            "https://provider.test",
            "",
        );

        let response = google_login(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://provider.test/google/auth?client_id=google-client"));
    }

    #[tokio::test]
    async fn test_failed_code_exchange_is_bad_request() {
        let base = spawn_mock(Router::new().route(
            "/google/token",
            post(|| async { (StatusCode::BAD_REQUEST, "invalid_grant") }),
        ))
        .await;
        let state = test_state(Arc::new(MemoryAccountStore::default()), &base, "");

        let err = google_callback(
            State(state),
            Query(GoogleCallbackParams {
                code: "bad".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let response = session_logout().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_me_returns_session_email() {
        let Json(body) = session_me(Extension(SessionUser {
            email: "ops@example.com".to_string(),
        }))
        .await;

        assert_eq!(body.email, "ops@example.com");
    }

    async fn callback_with_email(email: &str, allowed: &str) -> ApiResult<Response> {
        let id_token = signed_id_token(email, "google-client", "https://accounts.google.com");
        let base = spawn_mock(google_provider(id_token)).await;
        let state = test_state(Arc::new(MemoryAccountStore::default()), &base, allowed);

        google_callback(
            State(state),
            Query(GoogleCallbackParams {
                code: "code".to_string(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn test_verified_email_not_on_allowlist_is_forbidden() {
        let err = callback_with_email("stranger@example.com", "ops@example.com")
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_allowed_login_sets_session_cookie() {
        let response = callback_with_email("Ops@Example.com", "ops@example.com")
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "http://localhost:5173");

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let token = cookie
            .trim_start_matches("session=")
            .split(';')
            .next()
            .unwrap();
        let codec = SessionCodec::new(TEST_SESSION_SECRET);
        assert_eq!(codec.verify(token).as_deref(), Some("Ops@Example.com"));
    }
}
