//! User directory

use super::is_unique_violation;
use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserUpdate};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

type UserRow = (String, String, String, String, Option<String>, Option<String>);

const USER_COLUMNS: &str = "id, email, name, job_title, profile_picture, tags";

fn user_from_row((id, email, name, job_title, profile_picture, tags): UserRow) -> Result<User> {
    let tags = match tags {
        Some(raw) => Some(
            serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| Error::Corrupt(format!("tags of {}: {}", email, e)))?,
        ),
        None => None,
    };

    Ok(User {
        id,
        email,
        name,
        job_title,
        profile_picture,
        tags,
    })
}

fn encode_tags(tags: Option<&Vec<String>>) -> Option<String> {
    // Vec<String> always serializes.
    tags.map(|t| serde_json::Value::from(t.clone()).to_string())
}

#[derive(Clone, Copy)]
enum UserKey {
    Id,
    Email,
}

impl UserKey {
    fn column(self) -> &'static str {
        match self {
            UserKey::Id => "id",
            UserKey::Email => "email",
        }
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user. The email must not be taken yet.
    pub async fn create(&self, input: NewUser) -> Result<User> {
        let (Some(email), Some(name), Some(job_title)) = (
            required(input.email),
            required(input.name),
            required(input.job_title),
        ) else {
            return Err(Error::invalid("email, name and jobTitle are required."));
        };

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            job_title,
            profile_picture: input.profile_picture,
            tags: input.tags,
        };

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, name, job_title, profile_picture, tags) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.job_title)
        .bind(&user.profile_picture)
        .bind(encode_tags(user.tags.as_ref()))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                info!("[Users] Created {} ({})", user.name, user.email);
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(Error::Conflict("User already exists.".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        row.map(user_from_row).transpose()
    }

    /// All users in registration order, optionally leaving one email out.
    pub async fn list(&self, exclude: Option<&str>) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = match exclude {
            Some(email) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM users WHERE email <> ? ORDER BY rowid",
                    USER_COLUMNS
                ))
                .bind(email)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!("SELECT {} FROM users ORDER BY rowid", USER_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(user_from_row).collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(user_from_row).transpose()
    }

    /// Overwrite the given profile fields of the user with this email,
    /// leaving the others untouched.
    pub async fn update(&self, email: &str, update: UserUpdate) -> Result<User> {
        self.update_where(UserKey::Email, email, update).await?;
        self.find_by_email(email)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Same as [`UserStore::update`], addressed by store id.
    pub async fn update_by_id(&self, id: &str, update: UserUpdate) -> Result<User> {
        self.update_where(UserKey::Id, id, update).await?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }

        info!("[Users] Deleted {}", id);
        Ok(())
    }

    async fn update_where(&self, key: UserKey, value: &str, update: UserUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::invalid("No update fields provided"));
        }

        let result = sqlx::query(&format!(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                job_title = COALESCE(?, job_title),
                profile_picture = COALESCE(?, profile_picture),
                tags = COALESCE(?, tags)
            WHERE {} = ?
            "#,
            key.column()
        ))
        .bind(&update.name)
        .bind(&update.job_title)
        .bind(&update.profile_picture)
        .bind(encode_tags(update.tags.as_ref()))
        .bind(value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
