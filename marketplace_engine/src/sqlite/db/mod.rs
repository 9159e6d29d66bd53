//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Transactions in this crate always start with a write. SQLite cannot upgrade a read lock to a write lock while
//! another connection is writing, so a transaction that reads first can fail with `SQLITE_BUSY` under contention.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

use crate::traits::MarketplaceError;

pub mod categories;
pub mod conversations;
pub mod messages;
pub mod orders;
pub mod product_items;
pub mod products;
pub mod users;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Takes the single row of a drained `INSERT … RETURNING` statement.
///
/// SQLite keeps a `RETURNING` write pending on the connection until the statement has been stepped to the end, so
/// these statements are always executed with `fetch_all`, never `fetch_one` or `fetch_optional`.
pub(crate) fn single_row<T>(mut rows: Vec<T>) -> Result<T, MarketplaceError> {
    rows.pop().ok_or_else(|| MarketplaceError::from(SqlxError::RowNotFound))
}

/// Escapes the `LIKE` wildcards in `term` so that it matches literally. Use together with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}
