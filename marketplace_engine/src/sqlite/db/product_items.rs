use log::{debug, trace};
use sqlx::SqliteConnection;

use super::single_row;
use crate::{db_types::ProductItem, traits::MarketplaceError};

pub async fn insert_product_item(
    product_id: i64,
    data: &str,
    conn: &mut SqliteConnection,
) -> Result<ProductItem, MarketplaceError> {
    let rows = sqlx::query_as("INSERT INTO product_items (product_id, data) VALUES ($1, $2) RETURNING *;")
        .bind(product_id)
        .bind(data)
        .fetch_all(conn)
        .await?;
    let item: ProductItem = single_row(rows)?;
    trace!("🗃️ Item #{} added to product #{product_id}", item.id);
    Ok(item)
}

pub async fn fetch_product_item(
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ProductItem>, MarketplaceError> {
    let item = sqlx::query_as("SELECT * FROM product_items WHERE id = $1").bind(item_id).fetch_optional(conn).await?;
    Ok(item)
}

/// The items of a product, oldest first. With `available_only`, items that have already been delivered are left out.
pub async fn fetch_product_items(
    product_id: i64,
    available_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductItem>, MarketplaceError> {
    let items = sqlx::query_as(
        r#"
            SELECT * FROM product_items
            WHERE product_id = $1 AND ($2 = 0 OR is_used = 0)
            ORDER BY id ASC;
        "#,
    )
    .bind(product_id)
    .bind(available_only)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Flags the item as delivered, provided it has not been delivered already. Returns `None` if the item does not exist
/// or is already used.
pub async fn mark_used(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<ProductItem>, MarketplaceError> {
    let item = sqlx::query_as::<_, ProductItem>(
        r#"
            UPDATE product_items SET is_used = 1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND is_used = 0
            RETURNING *;
        "#,
    )
    .bind(item_id)
    .fetch_all(conn)
    .await?
    .pop();
    match &item {
        Some(_) => debug!("🗃️ Item #{item_id} marked as used"),
        None => debug!("🗃️ Item #{item_id} is missing or already used"),
    }
    Ok(item)
}
