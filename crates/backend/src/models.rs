// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Insertable struct for a freshly linked (or re-linked) account
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::accounts)]
pub struct NewAccount {
    pub spotify_user_id: String,
    pub display_name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
}

/// Credentials written back after a refresh.
/// A `None` refresh token leaves the stored one untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::accounts)]
pub struct TokenUpdate<'a> {
    pub access_token: &'a str,
    pub token_expires_at: DateTime<Utc>,
    pub refresh_token: Option<&'a str>,
}
