use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::single_row;
use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    mkt_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, MarketplaceError> {
    let rows = sqlx::query_as(
        "INSERT INTO orders (customer_id, product_id, product_item_id) VALUES ($1, $2, $3) RETURNING *;",
    )
    .bind(order.customer_id)
    .bind(order.product_id)
    .bind(order.product_item_id)
    .fetch_all(conn)
    .await?;
    let order: Order = single_row(rows)?;
    debug!("🗃️ Order #{} inserted for customer {:?}", order.id, order.customer_id);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, MarketplaceError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Sets the status of the order to `new_status`, but only if it is currently `expected`.
///
/// Returns `None` when the order does not exist or its status is no longer `expected`, i.e. someone else got there
/// first.
pub async fn transition_status(
    order_id: i64,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(order_id)
    .bind(expected)
    .fetch_all(conn)
    .await?
    .pop();
    match &order {
        Some(_) => trace!("🗃️ Order #{order_id} moved from {expected} to {new_status}"),
        None => trace!("🗃️ Order #{order_id} is no longer {expected}. Not moving it to {new_status}"),
    }
    Ok(order)
}

/// Builds the error for an order whose conditional status update matched nothing, using its current status.
pub async fn status_conflict(
    order_id: i64,
    action: &'static str,
    conn: &mut SqliteConnection,
) -> MarketplaceError {
    match fetch_order(order_id, conn).await {
        Ok(Some(order)) => MarketplaceError::OrderStatusConflict { order_id, status: order.status, action },
        Ok(None) => MarketplaceError::OrderNotFound(order_id),
        Err(e) => e,
    }
}

pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, MarketplaceError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    if !query.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("product_id IN (SELECT id FROM products WHERE seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
        where_clause.push_unseparated(")");
    }
    if let Some(pid) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(pid);
    }
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of order search: {} rows", orders.len());
    Ok(orders)
}
