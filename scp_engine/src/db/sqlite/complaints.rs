use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db_types::{Complaint, NewComplaint};

pub(crate) async fn insert_complaint(
    complaint: NewComplaint,
    conn: &mut SqliteConnection,
) -> Result<Complaint, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let complaint = sqlx::query_as(
        r#"
            INSERT INTO complaints (
                id,
                conversation_id,
                consumer_id,
                supplier_id,
                order_id,
                title,
                description,
                priority,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'open')
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&complaint.conversation_id)
    .bind(&complaint.consumer_id)
    .bind(&complaint.supplier_id)
    .bind(&complaint.order_id)
    .bind(&complaint.title)
    .bind(&complaint.description)
    .bind(complaint.priority)
    .fetch_one(conn)
    .await?;
    Ok(complaint)
}

pub async fn fetch_complaint_by_id(
    complaint_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Complaint>, sqlx::Error> {
    let complaint =
        sqlx::query_as("SELECT * FROM complaints WHERE id = $1").bind(complaint_id).fetch_optional(conn).await?;
    Ok(complaint)
}

pub async fn fetch_complaints_for_supplier(
    supplier_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Complaint>, sqlx::Error> {
    let complaints = sqlx::query_as("SELECT * FROM complaints WHERE supplier_id = $1 ORDER BY created_at DESC")
        .bind(supplier_id)
        .fetch_all(conn)
        .await?;
    Ok(complaints)
}

/// Marks the complaint escalated, recording the acting staff member and the time. Returns `None` if the complaint
/// does not exist. The caller wraps this together with the escalation message insert in one transaction.
pub(crate) async fn escalate(
    complaint_id: &str,
    staff_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Complaint>, sqlx::Error> {
    let complaint = sqlx::query_as(
        r#"
            UPDATE complaints
            SET status = 'escalated', escalated_by = $1, escalated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(staff_id)
    .bind(complaint_id)
    .fetch_optional(conn)
    .await?;
    Ok(complaint)
}

/// Stores the resolution and marks the complaint resolved. Returns `None` if the complaint does not exist.
pub(crate) async fn resolve(
    complaint_id: &str,
    resolution: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Complaint>, sqlx::Error> {
    let complaint = sqlx::query_as(
        r#"
            UPDATE complaints
            SET status = 'resolved', resolution = $1, resolved_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(resolution)
    .bind(complaint_id)
    .fetch_optional(conn)
    .await?;
    Ok(complaint)
}
