//! Auth-related types.

use serde::{Deserialize, Serialize};

// Re-export shared types for convenience
pub use shared_types::SessionUserResponse;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Google account email
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated operator, attached to the request by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub email: String,
}
