use log::{debug, trace};
use sqlx::SqliteConnection;

use super::single_row;
use crate::{
    db_types::{Conversation, Participant},
    traits::MarketplaceError,
};

pub async fn insert_conversation(
    product_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Conversation, MarketplaceError> {
    let rows = sqlx::query_as("INSERT INTO conversations (product_id) VALUES ($1) RETURNING *;")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    let conversation: Conversation = single_row(rows)?;
    debug!("🗃️ Conversation #{} created (product {:?})", conversation.id, conversation.product_id);
    Ok(conversation)
}

pub async fn fetch_conversation(
    conversation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Conversation>, MarketplaceError> {
    let conversation = sqlx::query_as("SELECT * FROM conversations WHERE id = $1 AND deleted_at IS NULL")
        .bind(conversation_id)
        .fetch_optional(conn)
        .await?;
    Ok(conversation)
}

/// Bumps the conversation's `updated_at`. Returns `false` if the conversation does not exist or has been deleted.
///
/// Transactions on a conversation start with this call, which takes SQLite's write lock before anything is read.
pub async fn touch_conversation(conversation_id: i64, conn: &mut SqliteConnection) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        "UPDATE conversations SET updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(conversation_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn soft_delete_conversation(
    conversation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE conversations SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(conversation_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn conversations_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, MarketplaceError> {
    let conversations = sqlx::query_as(
        r#"
            SELECT conversations.* FROM conversations
            JOIN participants ON participants.conversation_id = conversations.id
            WHERE participants.user_id = $1 AND conversations.deleted_at IS NULL
            ORDER BY conversations.updated_at DESC, conversations.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(conversations)
}

pub async fn conversations_for_product(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, MarketplaceError> {
    let conversations = sqlx::query_as(
        r#"
            SELECT * FROM conversations WHERE product_id = $1 AND deleted_at IS NULL
            ORDER BY updated_at DESC, id DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(conversations)
}

//--------------------------------------      Participants     ---------------------------------------------------------

/// Adds the user to the conversation. Returns `None` if the user is already a participant.
pub async fn insert_participant(
    conversation_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Participant>, MarketplaceError> {
    let participant: Option<Participant> = sqlx::query_as(
        r#"
            INSERT INTO participants (conversation_id, user_id) VALUES ($1, $2)
            ON CONFLICT (conversation_id, user_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_all(conn)
    .await?
    .pop();
    trace!("🗃️ Participant #{user_id} added to conversation #{conversation_id}: {}", participant.is_some());
    Ok(participant)
}

pub async fn fetch_participants(
    conversation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Participant>, MarketplaceError> {
    let participants = sqlx::query_as(
        r#"
            SELECT participants.* FROM participants
            JOIN conversations ON conversations.id = participants.conversation_id
            WHERE participants.conversation_id = $1 AND conversations.deleted_at IS NULL
            ORDER BY participants.created_at ASC, participants.user_id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(conn)
    .await?;
    Ok(participants)
}

pub async fn is_participant(
    conversation_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM participants WHERE conversation_id = $1 AND user_id = $2)",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

/// Removes the user from the conversation, unless 2 or fewer participants remain. The floor check and the delete are
/// one statement. Returns whether a row was deleted.
pub async fn remove_participant_above_floor(
    conversation_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            DELETE FROM participants
            WHERE conversation_id = $1 AND user_id = $2
            AND (SELECT COUNT(*) FROM participants WHERE conversation_id = $1) > 2
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
