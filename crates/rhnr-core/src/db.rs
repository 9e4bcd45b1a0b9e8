use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use thiserror::Error;

pub type DbPool = Pool<Postgres>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to connect to station store {store}: {source}")]
    Connect {
        store: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Establish a new Postgres connection pool for the station store.
pub async fn connect(database_url: &str) -> Result<DbPool, DbError> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|source| DbError::Connect {
            store: store_identity(database_url),
            source,
        })
}

/// Connection URL without credentials or query parameters, safe to log
/// and to use as a snapshot identity.
pub fn store_identity(database_url: &str) -> String {
    let (scheme, rest) = database_url
        .split_once("://")
        .unwrap_or(("postgres", database_url));
    let location = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
    let location = location.split('?').next().unwrap_or(location);
    format!("{scheme}://{location}")
}
