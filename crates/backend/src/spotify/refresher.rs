use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use shared_types::Account;
use uuid::Uuid;

use super::{SpotifyClient, SpotifyError};
use crate::repository::AccountStore;

/// Keeps stored access tokens usable, refreshing them against Spotify on demand.
///
/// Refreshes for the same account are serialized: a caller that waited on a
/// refresh in progress reuses the token it produced instead of exchanging the
/// refresh token a second time.
pub struct TokenRefresher {
    store: Arc<dyn AccountStore>,
    spotify: SpotifyClient,
    // Entries exist only while a refresh for that account is in flight.
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenRefresher {
    pub fn new(store: Arc<dyn AccountStore>, spotify: SpotifyClient) -> Self {
        Self {
            store,
            spotify,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return an access token that is valid right now.
    ///
    /// Unexpired tokens are returned without touching the network. Otherwise a
    /// single refresh is attempted; on failure the error is returned and the
    /// stored credentials are left as they were.
    pub async fn ensure_valid_access_token(&self, account: &Account) -> Result<String, SpotifyError> {
        if account.token_valid_at(Utc::now()) {
            return Ok(account.access_token.clone());
        }

        let lock = self.lock_for(account.id);
        let result = async {
            let _guard = lock.lock().await;
            self.refresh_locked(account).await
        }
        .await;
        self.release(account.id, lock);

        result
    }

    async fn refresh_locked(&self, account: &Account) -> Result<String, SpotifyError> {
        let current = self
            .store
            .get(account.id)
            .await
            .map_err(SpotifyError::Store)?
            .unwrap_or_else(|| account.clone());
        if current.token_valid_at(Utc::now()) {
            tracing::debug!("Token for account {} was refreshed concurrently", account.id);
            return Ok(current.access_token);
        }

        let grant = self.spotify.refresh(&current.refresh_token).await.inspect_err(|e| {
            tracing::error!(
                "Token refresh failed for Spotify user {}: {}",
                current.spotify_user_id,
                e
            )
        })?;

        let expires_at = grant.expires_at(Utc::now())?;
        self.store
            .update_tokens(
                account.id,
                &grant.access_token,
                expires_at,
                grant.refresh_token.as_deref(),
            )
            .await
            .map_err(SpotifyError::Store)?;

        tracing::info!(
            "Refreshed access token for Spotify user {} (rotated refresh token: {})",
            current.spotify_user_id,
            grant.refresh_token.is_some()
        );

        Ok(grant.access_token)
    }

    fn lock_for(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Drop our handle and forget the lock once nobody else holds it.
    ///
    /// Handles are cloned and dropped under the map lock, so the count is
    /// stable here. A caller cancelled mid-refresh can leave an entry behind;
    /// the next refresh of that account clears it.
    fn release(&self, id: Uuid, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
