use log::trace;
use sqlx::SqliteConnection;

use super::single_row;
use crate::{
    db_types::{Message, NewMessage},
    mkt_api::product_objects::Pagination,
    traits::MarketplaceError,
};

/// Appends a message to the log. No membership checks are made here.
pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, MarketplaceError> {
    let is_system = message.is_system();
    let rows = sqlx::query_as(
        r#"
            INSERT INTO messages (conversation_id, sender_id, order_id, text, is_system)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(message.conversation_id)
    .bind(message.sender_id)
    .bind(message.order_id)
    .bind(message.text)
    .bind(is_system)
    .fetch_all(conn)
    .await?;
    let message: Message = single_row(rows)?;
    trace!("🗃️ Message #{} stored in conversation #{}", message.id, message.conversation_id);
    Ok(message)
}

pub async fn fetch_messages(
    conversation_id: i64,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Message>, MarketplaceError> {
    let messages = sqlx::query_as(
        r#"
            SELECT * FROM messages WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(conversation_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(conn)
    .await?;
    Ok(messages)
}

pub async fn fetch_last_message(
    conversation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Message>, MarketplaceError> {
    let message = sqlx::query_as(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(conversation_id)
    .fetch_optional(conn)
    .await?;
    Ok(message)
}

pub async fn messages_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Message>, MarketplaceError> {
    let messages = sqlx::query_as(
        r#"
            SELECT messages.* FROM messages
            JOIN conversations ON conversations.id = messages.conversation_id
            WHERE messages.order_id = $1 AND conversations.deleted_at IS NULL
            ORDER BY messages.created_at ASC, messages.id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(messages)
}
