//! Connection Request Handlers

use super::JsonBody;
use crate::config::AppState;
use crate::error::Result;
use crate::models::{ConnectionStatus, Invitation, PublicProfile, SuggestedUser};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Body of `POST /connections`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestBody {
    pub requester_email: Option<String>,
    pub target_email: Option<String>,
}

/// Body of `POST /connections/invitation/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondBody {
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestSent {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Responded {
    pub message: String,
    pub status: ConnectionStatus,
}

#[derive(Debug, Serialize)]
pub struct InvitationsResponse {
    pub invitations: Vec<Invitation>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedResponse {
    pub users: Vec<SuggestedUser>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<PublicProfile>,
}

/// POST /connections - Send a connection request
pub async fn send_connection_request(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ConnectionRequestBody>,
) -> Result<(StatusCode, Json<RequestSent>)> {
    let connection = state
        .connections
        .request(
            body.requester_email.as_deref().unwrap_or_default(),
            body.target_email.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestSent {
            message: "Connection request sent.".to_string(),
            id: connection.id,
        }),
    ))
}

/// GET /connections/invitations?email= - Pending invitations for a user
pub async fn list_invitations(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<InvitationsResponse>> {
    let invitations = state
        .connections
        .list_pending_invitations(query.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(InvitationsResponse { invitations }))
}

/// POST /connections/invitation/{id} - Accept or ignore an invitation
pub async fn respond_to_invitation(
    Path(invitation_id): Path<String>,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RespondBody>,
) -> Result<Json<Responded>> {
    info!("POST /connections/invitation/{} accept={}", invitation_id, body.accept);

    let status = state
        .connections
        .respond(
            &invitation_id,
            body.recipient_email.as_deref().unwrap_or_default(),
            body.accept,
        )
        .await?;

    Ok(Json(Responded {
        message: format!("Invitation {}.", status),
        status,
    }))
}

/// GET /connections/suggested?email= - Users to offer as new connections
pub async fn suggested_users(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<SuggestedResponse>> {
    let users = state
        .connections
        .suggested_users(query.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SuggestedResponse { users }))
}

/// GET /connections/my-connections?email= - Accepted connections of a user
pub async fn my_connections(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ConnectionsResponse>> {
    let connections = state
        .connections
        .list_accepted_connections(query.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(ConnectionsResponse { connections }))
}
