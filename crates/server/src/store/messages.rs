//! Append-only message log

use super::{decode_time, encode_time};
use crate::error::Result;
use crate::models::Message;
use sqlx::SqlitePool;

type MessageRow = (String, String, String, String, String);

#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (id, from_email, to_email, message, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.from_email)
        .bind(&message.to_email)
        .bind(&message.message)
        .bind(encode_time(&message.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Conversation between two users in both directions, oldest first.
    /// Equal timestamps keep insertion order.
    pub async fn between(&self, user_email: &str, friend_email: &str) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, from_email, to_email, message, timestamp
            FROM messages
            WHERE (from_email = ? AND to_email = ?) OR (from_email = ? AND to_email = ?)
            ORDER BY timestamp ASC, seq ASC
            "#,
        )
        .bind(user_email)
        .bind(friend_email)
        .bind(friend_email)
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, from_email, to_email, message, timestamp)| {
                Ok(Message {
                    id,
                    from_email,
                    to_email,
                    message,
                    timestamp: decode_time(&timestamp)?,
                })
            })
            .collect()
    }
}
