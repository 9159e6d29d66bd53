//! Product storage and the inventory guard.
//!
//! `sold_count` is only ever changed by [`check_and_reserve`] and [`release_reservation`]. Both are single conditional
//! `UPDATE` statements, so SQLite serializes concurrent reservations for us and the predicate is evaluated against the
//! latest committed row.
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{like_pattern, single_row};
use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    mkt_api::product_objects::ProductQueryFilter,
    traits::MarketplaceError,
};

pub async fn insert_product(
    seller_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, MarketplaceError> {
    let rows = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, title, description, price, category_id, disposable, max_sales)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(seller_id)
    .bind(product.title)
    .bind(product.description)
    .bind(product.price.value())
    .bind(product.category_id)
    .bind(product.disposable)
    .bind(product.max_sales)
    .fetch_all(conn)
    .await?;
    let product: Product = single_row(rows)?;
    debug!("🗃️ Product #{} '{}' listed by seller #{seller_id}", product.id, product.title);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, MarketplaceError> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Applies the changes in `update`. Returns `None` if the product does not exist, or if a new, non-zero `max_sales`
/// is below the number of units already sold at the time of writing.
pub async fn update_product(
    product_id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, MarketplaceError> {
    if update.is_empty() {
        return fetch_product(product_id, conn).await;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");
    if let Some(title) = update.title {
        builder.push(", title = ");
        builder.push_bind(title);
    }
    if let Some(description) = update.description {
        builder.push(", description = ");
        builder.push_bind(description);
    }
    if let Some(price) = update.price {
        builder.push(", price = ");
        builder.push_bind(price.value());
    }
    if let Some(category_id) = update.category_id {
        builder.push(", category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(is_active) = update.is_active {
        builder.push(", is_active = ");
        builder.push_bind(is_active);
    }
    if let Some(disposable) = update.disposable {
        builder.push(", disposable = ");
        builder.push_bind(disposable);
    }
    if let Some(max_sales) = update.max_sales {
        builder.push(", max_sales = ");
        builder.push_bind(max_sales);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    if let Some(max_sales) = update.max_sales {
        builder.push(" AND (");
        builder.push_bind(max_sales);
        builder.push(" = 0 OR sold_count <= ");
        builder.push_bind(max_sales);
        builder.push(")");
    }
    builder.push(" RETURNING *;");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_all(conn).await?.pop();
    Ok(product)
}

/// Adds `delta` to `sold_count` if the product is active and the cap (if any) allows it. Returns whether the row was
/// updated.
pub async fn check_and_reserve(
    product_id: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE products SET sold_count = sold_count + $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND is_active = 1 AND (max_sales = 0 OR sold_count + $1 <= max_sales);
        "#,
    )
    .bind(delta)
    .bind(product_id)
    .execute(conn)
    .await?;
    let reserved = result.rows_affected() == 1;
    trace!("🗃️ Reserve {delta} of product #{product_id}: {reserved}");
    Ok(reserved)
}

pub async fn release_reservation(
    product_id: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE products SET sold_count = sold_count - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND sold_count >= $1;
        "#,
    )
    .bind(delta)
    .bind(product_id)
    .execute(conn)
    .await?;
    let released = result.rows_affected() == 1;
    trace!("🗃️ Release {delta} of product #{product_id}: {released}");
    Ok(released)
}

/// Deactivates the product unless an order for it is still `pending` or `confirmed`. Returns `None` if nothing was
/// updated, either because the product does not exist or because it has open orders.
pub async fn deactivate_if_idle(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, MarketplaceError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            UPDATE products SET is_active = 0, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND NOT EXISTS (
                SELECT 1 FROM orders WHERE product_id = $1 AND status IN ('pending', 'confirmed')
            )
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(product)
}

pub async fn search_products(
    query: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, MarketplaceError> {
    let page = query.page();
    let mut builder = QueryBuilder::new("SELECT * FROM products");
    push_filter(&mut builder, &query);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ Result of product search: {} rows", products.len());
    Ok(products)
}

pub async fn count_products(query: ProductQueryFilter, conn: &mut SqliteConnection) -> Result<i64, MarketplaceError> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_filter(&mut builder, &query);
    let count = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(count)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: &ProductQueryFilter) {
    if !query.has_conditions() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(category_id) = query.category_id {
        where_clause.push("category_id = ");
        where_clause.push_bind_unseparated(category_id);
    }
    if let Some(min) = query.min_price {
        where_clause.push("price >= ");
        where_clause.push_bind_unseparated(min.value());
    }
    if let Some(max) = query.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(max.value());
    }
    if let Some(is_active) = query.is_active {
        where_clause.push("is_active = ");
        where_clause.push_bind_unseparated(is_active);
    }
    if let Some(disposable) = query.disposable {
        where_clause.push("disposable = ");
        where_clause.push_bind_unseparated(disposable);
    }
    if let Some(term) = query.search_term() {
        let pattern = like_pattern(&term.to_lowercase());
        where_clause.push("(LOWER(title) LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR LOWER(description) LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\')");
    }
}
