use anyhow::Context;
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    AsyncPgConnection,
};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection = Object<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    // Parse the connection string and connect with TLS
    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    // Build the async connection from the tokio-postgres client
    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool(database_url: &str, use_tls: bool) -> anyhow::Result<DbPool> {
    let manager = if use_tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };

    let pool = Pool::builder(manager).build()?;

    Ok(pool)
}

pub async fn get_conn(pool: &DbPool) -> anyhow::Result<DbConnection> {
    pool.get()
        .await
        .context("Failed to get database connection")
}

// Account database operations
pub mod accounts {
    use chrono::{DateTime, Utc};
    use diesel::prelude::*;
    use diesel::upsert::excluded;
    use diesel_async::scoped_futures::ScopedFutureExt;
    use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
    use shared_types::Account;
    use uuid::Uuid;

    use crate::models::{NewAccount, TokenUpdate};

    pub async fn list_ordered(conn: &mut AsyncPgConnection) -> anyhow::Result<Vec<Account>> {
        use crate::schema::accounts::dsl::*;

        let rows = accounts
            .order_by((sort_order.asc(), display_name.asc()))
            .load::<Account>(conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
    ) -> anyhow::Result<Option<Account>> {
        use crate::schema::accounts::dsl::*;

        let account = accounts
            .filter(id.eq(account_id))
            .first::<Account>(conn)
            .await
            .optional()?;

        Ok(account)
    }

    /// Insert, or overwrite name and credentials of the row with the same
    /// Spotify user id. `sort_order` of an existing row is kept.
    pub async fn upsert(
        conn: &mut AsyncPgConnection,
        new_account: &NewAccount,
    ) -> anyhow::Result<Account> {
        use crate::schema::accounts::dsl::*;

        let account = diesel::insert_into(accounts)
            .values(new_account)
            .on_conflict(spotify_user_id)
            .do_update()
            .set((
                display_name.eq(excluded(display_name)),
                access_token.eq(excluded(access_token)),
                refresh_token.eq(excluded(refresh_token)),
                token_expires_at.eq(excluded(token_expires_at)),
            ))
            .get_result::<Account>(conn)
            .await?;

        Ok(account)
    }

    pub async fn update_tokens(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
        new_access_token: &str,
        expires_at: DateTime<Utc>,
        new_refresh_token: Option<&str>,
    ) -> anyhow::Result<Account> {
        use crate::schema::accounts::dsl::*;

        let changes = TokenUpdate {
            access_token: new_access_token,
            token_expires_at: expires_at,
            refresh_token: new_refresh_token,
        };

        let updated = diesel::update(accounts.filter(id.eq(account_id)))
            .set(&changes)
            .get_result::<Account>(conn)
            .await?;

        Ok(updated)
    }

    /// Rewrite `sort_order` so it matches each id's position. Ids that do not
    /// exist are skipped. Runs in a single transaction.
    pub async fn reorder(conn: &mut AsyncPgConnection, ordered_ids: &[Uuid]) -> anyhow::Result<()> {
        use crate::schema::accounts::dsl::*;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                for (position, account_id) in ordered_ids.iter().enumerate() {
                    diesel::update(accounts.filter(id.eq(*account_id)))
                        .set(sort_order.eq(position as i32))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    /// Returns `false` when no row had this id.
    pub async fn delete(conn: &mut AsyncPgConnection, account_id: Uuid) -> anyhow::Result<bool> {
        use crate::schema::accounts::dsl::*;

        let deleted = diesel::delete(accounts.filter(id.eq(account_id)))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}
