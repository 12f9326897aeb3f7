use log::debug;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db_types::Conversation;

pub async fn fetch_conversation_by_id(
    conversation_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Conversation>, sqlx::Error> {
    let conv =
        sqlx::query_as("SELECT * FROM conversations WHERE id = $1").bind(conversation_id).fetch_optional(conn).await?;
    Ok(conv)
}

pub async fn fetch_conversation_by_pair(
    consumer_id: &str,
    supplier_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Conversation>, sqlx::Error> {
    let conv = sqlx::query_as("SELECT * FROM conversations WHERE consumer_id = $1 AND supplier_id = $2")
        .bind(consumer_id)
        .bind(supplier_id)
        .fetch_optional(conn)
        .await?;
    Ok(conv)
}

/// Returns the conversation for the pair, creating it first if needed.
///
/// Concurrent first-contacts race on the `(consumer_id, supplier_id)` uniqueness constraint: the insert deliberately
/// swallows a conflict (`ON CONFLICT DO NOTHING`) and the follow-up read returns whichever row won. Every caller
/// therefore ends up with the same, single conversation.
pub(crate) async fn idempotent_insert(
    consumer_id: &str,
    supplier_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Conversation, sqlx::Error> {
    if let Some(conv) = fetch_conversation_by_pair(consumer_id, supplier_id, conn).await? {
        return Ok(conv);
    }
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
            INSERT INTO conversations (id, consumer_id, supplier_id, unread_count)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (consumer_id, supplier_id) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(consumer_id)
    .bind(supplier_id)
    .execute(&mut *conn)
    .await?;
    debug!("💬️ Conversation created (or found concurrently) for consumer {consumer_id} and supplier {supplier_id}");
    let conv = fetch_conversation_by_pair(consumer_id, supplier_id, conn).await?;
    conv.ok_or(sqlx::Error::RowNotFound)
}

pub async fn fetch_conversations_for_consumer(
    consumer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let convs = sqlx::query_as(
        "SELECT * FROM conversations WHERE consumer_id = $1 ORDER BY last_message_at DESC, created_at DESC",
    )
    .bind(consumer_id)
    .fetch_all(conn)
    .await?;
    Ok(convs)
}

pub async fn fetch_conversations_for_supplier(
    supplier_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let convs = sqlx::query_as(
        "SELECT * FROM conversations WHERE supplier_id = $1 ORDER BY last_message_at DESC, created_at DESC",
    )
    .bind(supplier_id)
    .fetch_all(conn)
    .await?;
    Ok(convs)
}

/// Refreshes the conversation's last-activity marker. When `bump_unread` is set (consumer senders), the
/// supplier-side unread counter is incremented as well.
pub(crate) async fn touch_last_message(
    conversation_id: &str,
    bump_unread: bool,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let sql = if bump_unread {
        "UPDATE conversations SET last_message_at = CURRENT_TIMESTAMP, unread_count = unread_count + 1 WHERE id = $1"
    } else {
        "UPDATE conversations SET last_message_at = CURRENT_TIMESTAMP WHERE id = $1"
    };
    sqlx::query(sql).bind(conversation_id).execute(conn).await?;
    Ok(())
}

pub(crate) async fn reset_unread(conversation_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET unread_count = 0 WHERE id = $1").bind(conversation_id).execute(conn).await?;
    Ok(())
}
