//! Connection graph
//!
//! Edges between two user emails. Every row carries the canonical pair key of
//! its two emails under a UNIQUE constraint, so a second edge for the same
//! unordered pair is rejected by SQLite even when two requests race past the
//! existence check.

use super::{decode_time, encode_time, is_unique_violation};
use crate::error::{Error, Result};
use crate::models::{Connection, ConnectionStatus, Invitation, PublicProfile};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

type ConnectionRow = (
    String,
    String,
    String,
    ConnectionStatus,
    String,
    Option<String>,
);

const CONNECTION_COLUMNS: &str =
    "id, requester_email, recipient_email, status, created_at, updated_at";

/// Direction-independent key for the pair {a, b}.
pub fn pair_key(a: &str, b: &str) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{}\n{}", low, high)
}

fn connection_from_row(
    (id, requester_email, recipient_email, status, created_at, updated_at): ConnectionRow,
) -> Result<Connection> {
    Ok(Connection {
        id,
        requester_email,
        recipient_email,
        status,
        created_at: decode_time(&created_at)?,
        updated_at: updated_at.as_deref().map(decode_time).transpose()?,
    })
}

#[derive(Clone)]
pub struct ConnectionStore {
    pool: SqlitePool,
}

impl ConnectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Any edge between `a` and `b`, whichever side requested it.
    pub async fn find_between(&self, a: &str, b: &str) -> Result<Option<Connection>> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM connections WHERE
             (requester_email = ? AND recipient_email = ?) OR
             (requester_email = ? AND recipient_email = ?)",
            CONNECTION_COLUMNS
        ))
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(&self.pool)
        .await?;

        row.map(connection_from_row).transpose()
    }

    /// Insert a new edge. A second edge for the same pair is a `Conflict`.
    pub async fn insert(&self, connection: &Connection) -> Result<()> {
        let inserted = sqlx::query(
            "INSERT INTO connections (id, requester_email, recipient_email, pair_key, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&connection.id)
        .bind(&connection.requester_email)
        .bind(&connection.recipient_email)
        .bind(pair_key(&connection.requester_email, &connection.recipient_email))
        .bind(connection.status)
        .bind(encode_time(&connection.created_at))
        .bind(connection.updated_at.as_ref().map(encode_time))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::Conflict("Connection already exists.".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Move a pending edge addressed to `recipient_email` into `status`.
    /// Returns false when nothing matched.
    pub async fn resolve(
        &self,
        id: &str,
        recipient_email: &str,
        status: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE connections SET status = ?, updated_at = ?
             WHERE id = ? AND recipient_email = ? AND status = ?",
        )
        .bind(status)
        .bind(encode_time(&at))
        .bind(id)
        .bind(recipient_email)
        .bind(ConnectionStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The edge with this id, but only if `recipient_email` is its recipient.
    pub async fn find_for_recipient(
        &self,
        id: &str,
        recipient_email: &str,
    ) -> Result<Option<Connection>> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM connections WHERE id = ? AND recipient_email = ?",
            CONNECTION_COLUMNS
        ))
        .bind(id)
        .bind(recipient_email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(connection_from_row).transpose()
    }

    /// Pending edges addressed to `email`, newest first, joined with the
    /// requester's profile. Edges whose requester is not in the directory
    /// are left out.
    pub async fn pending_for(&self, email: &str) -> Result<Vec<Invitation>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT c.id, u.email, u.name, u.job_title
            FROM connections c
            JOIN users u ON u.email = c.requester_email
            WHERE c.recipient_email = ? AND c.status = ?
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(email)
        .bind(ConnectionStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, email, name, job_title)| Invitation {
                id,
                user: PublicProfile {
                    email,
                    name,
                    job_title,
                },
            })
            .collect())
    }

    /// Profiles of everyone `email` has an accepted edge with.
    pub async fn accepted_for(&self, email: &str) -> Result<Vec<PublicProfile>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT u.email, u.name, u.job_title
            FROM connections c
            JOIN users u ON u.email = CASE
                WHEN c.requester_email = ? THEN c.recipient_email
                ELSE c.requester_email
            END
            WHERE c.status = ? AND (c.requester_email = ? OR c.recipient_email = ?)
            ORDER BY c.created_at
            "#,
        )
        .bind(email)
        .bind(ConnectionStatus::Accepted)
        .bind(email)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(email, name, job_title)| PublicProfile {
                email,
                name,
                job_title,
            })
            .collect())
    }

    /// Every edge touching `email`, in any status.
    pub async fn touching(&self, email: &str) -> Result<Vec<Connection>> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM connections WHERE requester_email = ? OR recipient_email = ?",
            CONNECTION_COLUMNS
        ))
        .bind(email)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(connection_from_row).collect()
    }

    pub async fn count_between(&self, a: &str, b: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM connections WHERE pair_key = ?")
                .bind(pair_key(a, b))
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::pair_key;

    #[test]
    fn pair_key_ignores_direction() {
        assert_eq!(
            pair_key("alice@example.com", "bob@example.com"),
            pair_key("bob@example.com", "alice@example.com")
        );
    }

    #[test]
    fn pair_key_separates_pairs() {
        assert_ne!(
            pair_key("a@example.com", "bc@example.com"),
            pair_key("ab@example.com", "c@example.com")
        );
    }
}
