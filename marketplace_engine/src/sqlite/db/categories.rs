use log::debug;
use sqlx::SqliteConnection;

use super::single_row;
use crate::{db_types::Category, traits::MarketplaceError};

pub async fn insert_category(name: &str, conn: &mut SqliteConnection) -> Result<Category, MarketplaceError> {
    let rows: Vec<Category> = sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING *;")
        .bind(name)
        .fetch_all(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                MarketplaceError::invalid(format!("Category '{name}' already exists"))
            },
            _ => MarketplaceError::from(e),
        })?;
    let category = single_row(rows)?;
    debug!("🗃️ Category '{}' created with id {}", category.name, category.id);
    Ok(category)
}

pub async fn category_exists(category_id: i64, conn: &mut SqliteConnection) -> Result<bool, MarketplaceError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(category_id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}
