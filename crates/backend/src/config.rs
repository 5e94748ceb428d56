//! Process configuration loaded from the environment.

use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the allowlist is looked for when `ALLOWED_EMAILS_FILE` is unset.
const ALLOWLIST_CANDIDATES: [&str; 2] = ["allowed_emails.txt", "../allowed_emails.txt"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_tls: bool,
    pub frontend_url: String,
    pub frontend_dir: PathBuf,
    pub session_secret: String,
    pub allowlist_path: Option<PathBuf>,
    pub spotify: SpotifyConfig,
    pub google: GoogleConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Base of the accounts service (`/authorize`, `/api/token`).
    pub accounts_url: String,
    /// Base of the Web API (`/me`, `/me/player`).
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleConfig {
    /// Cookies only get `Secure` when the login flow is not served from a local host.
    pub fn is_local(&self) -> bool {
        self.redirect_uri.starts_with("http://localhost")
            || self.redirect_uri.starts_with("http://127.0.0.1")
    }
}

/// Timeouts applied to every outbound provider call.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl HttpConfig {
    /// Shared client for provider calls; reqwest pools connections internally.
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `DATABASE_URL`: Postgres connection string
    /// - `SESSION_SECRET`: HMAC secret for session cookies
    /// - `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`
    /// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        if session_secret.trim().is_empty() {
            bail!("SESSION_SECRET cannot be empty");
        }

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            connect_timeout: Duration::from_secs(env_parse(
                "HTTP_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )?),
            request_timeout: Duration::from_secs(env_parse(
                "HTTP_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .context("BIND_ADDR must be a socket address")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_tls: env_parse("DATABASE_TLS", false)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            frontend_dir: env::var("FRONTEND_DIR")
                .unwrap_or_else(|_| "static".to_string())
                .into(),
            session_secret,
            allowlist_path: resolve_allowlist_path(
                env::var("ALLOWED_EMAILS_FILE").ok().map(PathBuf::from),
            ),
            spotify: SpotifyConfig {
                client_id: env::var("SPOTIFY_CLIENT_ID")
                    .context("SPOTIFY_CLIENT_ID must be set")?,
                client_secret: env::var("SPOTIFY_CLIENT_SECRET")
                    .context("SPOTIFY_CLIENT_SECRET must be set")?,
                redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                    .unwrap_or_else(|_| "http://localhost:8000/auth/callback".to_string()),
                accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                    .unwrap_or_else(|_| "https://accounts.spotify.com".to_string()),
                api_url: env::var("SPOTIFY_API_URL")
                    .unwrap_or_else(|_| "https://api.spotify.com/v1".to_string()),
            },
            google: GoogleConfig {
                client_id: env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID must be set")?,
                client_secret: env::var("GOOGLE_CLIENT_SECRET")
                    .context("GOOGLE_CLIENT_SECRET must be set")?,
                redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|_| "http://localhost:8000/google/callback".to_string()),
            },
            http,
        })
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

/// An explicit path always wins, even if the file is missing (the allowlist
/// then loads empty). Otherwise the first existing candidate is used.
pub fn resolve_allowlist_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        ALLOWLIST_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    })
}
