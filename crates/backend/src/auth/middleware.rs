//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use cookie::{Cookie, SameSite};

use crate::error::ErrorResponse;
use crate::AppState;

use super::allowlist::Allowlist;
use super::session::{SessionCodec, SESSION_TTL_DAYS};
use super::types::{SessionUser, SESSION_COOKIE};

/// Reachable without a session: the two login flows and the health check.
const PUBLIC_PATHS: [&str; 5] = [
    "/google/login",
    "/google/callback",
    "/auth/login",
    "/auth/callback",
    "/api/health",
];

/// Unauthenticated requests under these prefixes get a 401 instead of a redirect.
const API_PREFIXES: [&str; 3] = ["/auth/", "/playback/", "/api/"];

pub const LOGIN_PATH: &str = "/google/login";

/// Outcome of gating one request.
#[derive(Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated(SessionUser),
    Unauthenticated,
}

/// Decide access from the request path and session token alone.
pub fn evaluate(
    path: &str,
    token: Option<&str>,
    sessions: &SessionCodec,
    allowlist: &Allowlist,
) -> Access {
    if PUBLIC_PATHS.contains(&path) {
        return Access::Public;
    }

    token
        .and_then(|t| sessions.verify(t))
        .filter(|email| allowlist.is_allowed(email))
        .map(|email| Access::Authenticated(SessionUser { email }))
        .unwrap_or(Access::Unauthenticated)
}

pub fn is_api_path(path: &str) -> bool {
    API_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Middleware requiring a valid, allowlisted session on every non-public path.
///
/// Used with `axum::middleware::from_fn_with_state`. On success the
/// [`SessionUser`] is available to handlers as a request extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let token = session_token(request.headers());

    match evaluate(&path, token.as_deref(), &state.sessions, &state.allowlist) {
        Access::Public => next.run(request).await,
        Access::Authenticated(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Access::Unauthenticated if is_api_path(&path) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Not authenticated")),
        )
            .into_response(),
        Access::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Session cookie set after Google login.
pub fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Cookie that makes the browser drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}
