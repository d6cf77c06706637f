/**
 * Database Operations for Chat Messages
 *
 * Persists discussion-room messages and replays history on join. Messages
 * are immutable once created and always read back in creation order, with
 * the sender's display name joined in.
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A saved message with its sender's display name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    #[sqlx(rename = "sender_name")]
    pub sender_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Save a message and return it with the sender name resolved.
pub async fn save_message(
    pool: &PgPool,
    user_id: Uuid,
    book_id: Uuid,
    message: &str,
) -> Result<ChatMessageView, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageView>(
        r#"
        WITH inserted AS (
            INSERT INTO chat_messages (user_id, book_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, message, created_at
        )
        SELECT i.id, i.user_id, i.book_id, m.name AS sender_name, i.message, i.created_at
        FROM inserted i
        INNER JOIN members m ON m.id = i.user_id
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(message)
    .fetch_one(pool)
    .await
}

/// All messages of one room, oldest first.
pub async fn load_room_history(
    pool: &PgPool,
    book_id: Uuid,
) -> Result<Vec<ChatMessageView>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessageView>(
        r#"
        SELECT c.id, c.user_id, c.book_id, m.name AS sender_name, c.message, c.created_at
        FROM chat_messages c
        INNER JOIN members m ON m.id = c.user_id
        WHERE c.book_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await
}

/// Whether the book behind a room exists.
pub async fn book_exists(pool: &PgPool, book_id: Uuid) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
        .bind(book_id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}
