//! Authentication for the control panel: Google login with an email
//! allowlist, signed session cookies, and the middleware gating every route.
//!
//! This module provides:
//! - Session token issuing and verification
//! - Google OAuth flow for user login
//! - `require_session` middleware for protecting routes
//! - Email allowlist loading and checks

mod allowlist;
mod google;
mod handlers;
mod middleware;
mod session;
pub mod types;

pub use allowlist::Allowlist;
pub use google::{GoogleAuthError, GoogleClient, GoogleEndpoints};
pub use handlers::{google_callback, google_login, session_logout, session_me};
pub use middleware::{require_session, session_token};
pub use session::SessionCodec;
pub use types::SessionUser;
