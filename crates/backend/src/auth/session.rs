//! Signed session tokens carried in the `session` cookie.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::types::SessionClaims;

/// How long a session stays valid after Google login.
pub const SESSION_TTL_DAYS: i64 = 7;

/// HS256 codec for session tokens.
///
/// There is no revocation list: a token is valid until it expires, and
/// rotating the secret invalidates every outstanding session.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create a token for `email` that expires in seven days.
    pub fn issue(&self, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(email, Utc::now())
    }

    /// Create a token as if issued at `now`.
    pub fn issue_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = now + Duration::days(SESSION_TTL_DAYS);

        let claims = SessionClaims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Return the email of a valid, unexpired token.
    ///
    /// Bad signatures, malformed payloads and expired tokens all yield `None`.
    pub fn verify(&self, token: &str) -> Option<String> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.email)
            .ok()
    }
}
