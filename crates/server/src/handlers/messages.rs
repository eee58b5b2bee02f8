use super::JsonBody;
use crate::config::AppState;
use crate::error::Result;
use crate::models::Message;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageBody {
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_email: Option<String>,
    pub friend_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageSaved {
    pub message: String,
    pub data: Message,
}

/// POST /messages
///
/// Same path as a `send-message` session event: stored first, then pushed to
/// the recipient if they are online.
pub async fn post_message(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PostMessageBody>,
) -> Result<(StatusCode, Json<MessageSaved>)> {
    let message = state
        .relay
        .send(
            body.from_email.as_deref().unwrap_or_default(),
            body.to_email.as_deref().unwrap_or_default(),
            body.message.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageSaved {
            message: "Message saved".to_string(),
            data: message,
        }),
    ))
}

/// GET /messages?userEmail=&friendEmail=
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>> {
    let history = state
        .relay
        .history(
            query.user_email.as_deref().unwrap_or_default(),
            query.friend_email.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(history))
}
