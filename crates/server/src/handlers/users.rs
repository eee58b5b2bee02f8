//! User directory handlers

use super::JsonBody;
use crate::config::AppState;
use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserUpdate};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Leave this email out of the listing
    pub exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllUsersQuery {
    /// The caller, left out of the listing
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserDeleted {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserSaved {
    pub message: String,
    pub data: User,
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<UserSaved>)> {
    let user = state.users.create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserSaved {
            message: "User created".to_string(),
            data: user,
        }),
    ))
}

/// GET /users, GET /users?exclude=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>> {
    let exclude = query.exclude.as_deref().filter(|e| !e.is_empty());
    Ok(Json(state.users.list(exclude).await?))
}

/// GET /allUsers?email= - everyone except the caller
pub async fn list_all_users(
    State(state): State<AppState>,
    Query(query): Query<AllUsersQuery>,
) -> Result<Json<Vec<User>>> {
    let exclude = query.email.as_deref().filter(|e| !e.is_empty());
    Ok(Json(state.users.list(exclude).await?))
}

/// GET /users/email/{email}
pub async fn get_user_by_email(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<User>> {
    state
        .users
        .find_by_email(&email)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// PUT /users/{email}
pub async fn update_user(
    Path(email): Path<String>,
    State(state): State<AppState>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserSaved>> {
    info!("PUT /users/{}", email);

    let user = state.users.update(&email, update).await?;

    Ok(Json(UserSaved {
        message: "User updated".to_string(),
        data: user,
    }))
}

/// PATCH /users/{id}
pub async fn patch_user(
    Path(id): Path<String>,
    State(state): State<AppState>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserSaved>> {
    let user = state.users.update_by_id(&id, update).await?;

    Ok(Json(UserSaved {
        message: "User updated".to_string(),
        data: user,
    }))
}

/// DELETE /users/{id}
pub async fn delete_user(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserDeleted>> {
    info!("DELETE /users/{}", id);
    state.users.delete_by_id(&id).await?;

    Ok(Json(UserDeleted {
        message: "User deleted".to_string(),
    }))
}
