//! Google OAuth login: authorize URL, code exchange and ID-token verification.

use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("request to Google failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token exchange failed with {status}: {body}")]
    TokenExchange {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid ID token: {0}")]
    InvalidIdToken(#[from] jsonwebtoken::errors::Error),

    #[error("ID token signed with unknown key")]
    UnknownSigningKey,
}

/// Endpoints used by the login flow; overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub certs_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            certs_url: GOOGLE_CERTS_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    email: String,
}

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    config: GoogleConfig,
    endpoints: GoogleEndpoints,
}

impl GoogleClient {
    pub fn new(http: reqwest::Client, config: GoogleConfig, endpoints: GoogleEndpoints) -> Self {
        Self {
            http,
            config,
            endpoints,
        }
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// URL the browser is sent to for login (email scope only, account picker shown).
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=online&\
             prompt=select_account",
            self.endpoints.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("openid email"),
        )
    }

    /// Exchange an authorization code for the ID token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, GoogleAuthError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::TokenExchange { status, body });
        }

        let tokens: GoogleTokenResponse = response.json().await?;
        Ok(tokens.id_token)
    }

    /// Verify signature, issuer, audience and expiry of an ID token against
    /// Google's published keys and return its email claim.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<String, GoogleAuthError> {
        let header = decode_header(id_token)?;
        let kid = header.kid.ok_or(GoogleAuthError::UnknownSigningKey)?;

        let jwks: JwkSet = self
            .http
            .get(&self.endpoints.certs_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let jwk = jwks.find(&kid).ok_or(GoogleAuthError::UnknownSigningKey)?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<IdTokenClaims>(id_token, &key, &validation)?;
        Ok(data.claims.email)
    }
}
