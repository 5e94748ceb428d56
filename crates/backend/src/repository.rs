//! Account persistence behind a trait seam.
//!
//! Handlers, the token refresher and the playback relay only see
//! [`AccountStore`]; production wires in [`PgAccountStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::Account;
use uuid::Uuid;

use crate::db::{self, get_conn, DbPool};
use crate::models::NewAccount;

/// Storage operations for linked Spotify accounts.
///
/// Every mutating call is its own statement or transaction and is committed
/// before it returns.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts in display order.
    async fn list(&self) -> Result<Vec<Account>>;

    async fn get(&self, id: Uuid) -> Result<Option<Account>>;

    /// Create the account, or overwrite the one with the same Spotify user id.
    async fn upsert(&self, account: NewAccount) -> Result<Account>;

    /// Persist refreshed credentials. `refresh_token` is only written when `Some`.
    async fn update_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
        refresh_token: Option<&str>,
    ) -> Result<Account>;

    /// Assign `sort_order` from list position; unknown ids are ignored.
    async fn reorder(&self, ordered_ids: &[Uuid]) -> Result<()>;

    /// Returns `false` if the account did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Postgres-backed store using the diesel-async pool.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn list(&self) -> Result<Vec<Account>> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::list_ordered(&mut conn).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Account>> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::get_by_id(&mut conn, id).await
    }

    async fn upsert(&self, account: NewAccount) -> Result<Account> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::upsert(&mut conn, &account)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "Failed to upsert account for Spotify user {}: {:?}",
                    account.spotify_user_id,
                    e
                )
            })
            .with_context(|| format!("upsert of Spotify user {}", account.spotify_user_id))
    }

    async fn update_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
        refresh_token: Option<&str>,
    ) -> Result<Account> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::update_tokens(&mut conn, id, access_token, expires_at, refresh_token)
            .await
            .with_context(|| format!("token update for account {}", id))
    }

    async fn reorder(&self, ordered_ids: &[Uuid]) -> Result<()> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::reorder(&mut conn, ordered_ids).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut conn = get_conn(&self.pool).await?;
        db::accounts::delete(&mut conn, id).await
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::Mutex;

    /// In-process store with the same upsert and ordering rules as Postgres.
    #[derive(Default)]
    pub struct MemoryAccountStore {
        rows: Mutex<Vec<Account>>,
    }

    impl MemoryAccountStore {
        pub fn with_accounts(accounts: Vec<Account>) -> Self {
            Self {
                rows: Mutex::new(accounts),
            }
        }
    }

    #[async_trait]
    impl AccountStore for MemoryAccountStore {
        async fn list(&self) -> Result<Vec<Account>> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| {
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| a.display_name.cmp(&b.display_name))
            });
            Ok(rows)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Account>> {
            Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
        }

        async fn upsert(&self, account: NewAccount) -> Result<Account> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows
                .iter_mut()
                .find(|a| a.spotify_user_id == account.spotify_user_id)
            {
                existing.display_name = account.display_name;
                existing.access_token = account.access_token;
                existing.refresh_token = account.refresh_token;
                existing.token_expires_at = account.token_expires_at;
                return Ok(existing.clone());
            }

            let created = Account {
                id: Uuid::new_v4(),
                spotify_user_id: account.spotify_user_id,
                display_name: account.display_name,
                access_token: account.access_token,
                refresh_token: account.refresh_token,
                token_expires_at: account.token_expires_at,
                sort_order: 0,
            };
            rows.push(created.clone());
            Ok(created)
        }

        async fn update_tokens(
            &self,
            id: Uuid,
            access_token: &str,
            expires_at: DateTime<Utc>,
            refresh_token: Option<&str>,
        ) -> Result<Account> {
            let mut rows = self.rows.lock().unwrap();
            let account = rows
                .iter_mut()
                .find(|a| a.id == id)
                .with_context(|| format!("account {} not found", id))?;
            account.access_token = access_token.to_string();
            account.token_expires_at = expires_at;
            if let Some(token) = refresh_token {
                account.refresh_token = token.to_string();
            }
            Ok(account.clone())
        }

        async fn reorder(&self, ordered_ids: &[Uuid]) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            for (position, id) in ordered_ids.iter().enumerate() {
                if let Some(account) = rows.iter_mut().find(|a| a.id == *id) {
                    account.sort_order = position as i32;
                }
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|a| a.id != id);
            Ok(rows.len() != before)
        }
    }
}
