use crate::config::AppState;
use crate::error::{Error, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PresenceQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PresenceStatus {
    pub email: String,
    pub online: bool,
}

/// GET /presence?email=
pub async fn get_presence(
    State(state): State<AppState>,
    Query(query): Query<PresenceQuery>,
) -> Result<Json<PresenceStatus>> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| Error::invalid("User email is required."))?;

    Ok(Json(PresenceStatus {
        online: state.presence.is_online(&email),
        email,
    }))
}
