use log::debug;
use sqlx::SqliteConnection;

use super::single_row;
use crate::{
    db_types::{NewUser, User},
    traits::MarketplaceError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, MarketplaceError> {
    let username = user.username.clone();
    let rows: Vec<User> = sqlx::query_as("INSERT INTO users (username, email) VALUES ($1, $2) RETURNING *;")
        .bind(user.username)
        .bind(user.email)
        .fetch_all(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                MarketplaceError::invalid(format!("Username or email of '{username}' is already registered"))
            },
            _ => MarketplaceError::from(e),
        })?;
    let user = single_row(rows)?;
    debug!("🗃️ User '{}' registered with id {}", user.username, user.id);
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, MarketplaceError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}
