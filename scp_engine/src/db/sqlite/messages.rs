use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db_types::{Message, NewMessage};

/// Inserts a message row. Not atomic on its own: callers pair this with `conversations::touch_last_message` inside a
/// transaction so a stored message and the conversation's activity marker can never diverge.
pub(crate) async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let message = sqlx::query_as(
        r#"
            INSERT INTO messages (id, conversation_id, sender_id, sender_role, content, attachment_url, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, 0)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&message.conversation_id)
    .bind(&message.sender_id)
    .bind(message.sender_role)
    .bind(&message.content)
    .bind(&message.attachment_url)
    .fetch_one(conn)
    .await?;
    Ok(message)
}

pub async fn fetch_messages_for_conversation(
    conversation_id: &str,
    limit: i64,
    offset: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Message>, sqlx::Error> {
    let messages =
        sqlx::query_as("SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC LIMIT $2 OFFSET $3")
            .bind(conversation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await?;
    Ok(messages)
}

/// Marks every message in the conversation not authored by the reader as read. Returns the number of rows changed.
pub(crate) async fn mark_read(
    conversation_id: &str,
    reader_id: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE conversation_id = $1 AND sender_id != $2 AND is_read = 0",
    )
    .bind(conversation_id)
    .bind(reader_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
