//! Connection Requests & Suggestions
//!
//! Request/accept/ignore state machine over the connection graph, plus the
//! read-side views built on it: pending invitations, accepted connections and
//! suggested users.

use crate::error::{Error, Result};
use crate::models::{
    Connection, ConnectionStatus, Invitation, PublicProfile, SuggestedUser,
};
use crate::store::{ConnectionStore, UserStore};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

fn is_missing(value: &str) -> bool {
    value.trim().is_empty()
}

fn require_email(email: &str) -> Result<()> {
    if is_missing(email) {
        return Err(Error::invalid("User email is required."));
    }
    Ok(())
}

/// Connection manager handles all connection-related operations
#[derive(Clone)]
pub struct ConnectionManager {
    connections: ConnectionStore,
    users: UserStore,
}

impl ConnectionManager {
    pub fn new(connections: ConnectionStore, users: UserStore) -> Self {
        Self { connections, users }
    }

    /// Send a connection request from `requester_email` to `target_email`.
    pub async fn request(&self, requester_email: &str, target_email: &str) -> Result<Connection> {
        if is_missing(requester_email) || is_missing(target_email) {
            return Err(Error::invalid("Both emails required."));
        }
        if requester_email == target_email {
            return Err(Error::invalid("You cannot connect with yourself."));
        }

        if let Some(existing) = self
            .connections
            .find_between(requester_email, target_email)
            .await?
        {
            warn!(
                "[Connections] {} -> {} rejected, edge {} is {}",
                requester_email, target_email, existing.id, existing.status
            );
            return Err(Error::Conflict("Connection already exists.".to_string()));
        }

        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            requester_email: requester_email.to_string(),
            recipient_email: target_email.to_string(),
            status: ConnectionStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };

        // The store's unique pair key catches a request that raced us here.
        self.connections.insert(&connection).await?;

        info!(
            "[Connections] Request sent: {} -> {}",
            requester_email, target_email
        );
        Ok(connection)
    }

    /// Accept or ignore an invitation. Only its recipient may answer it, and
    /// only once.
    pub async fn respond(
        &self,
        connection_id: &str,
        recipient_email: &str,
        accept: bool,
    ) -> Result<ConnectionStatus> {
        if is_missing(recipient_email) {
            return Err(Error::invalid("Recipient email required."));
        }

        let status = if accept {
            ConnectionStatus::Accepted
        } else {
            ConnectionStatus::Ignored
        };

        if self
            .connections
            .resolve(connection_id, recipient_email, status, Utc::now())
            .await?
        {
            info!("[Connections] Invitation {} {}", connection_id, status);
            return Ok(status);
        }

        match self
            .connections
            .find_for_recipient(connection_id, recipient_email)
            .await?
        {
            Some(existing) if existing.status.is_terminal() => {
                Err(Error::AlreadyResolved(existing.status))
            }
            _ => Err(Error::NotFound(
                "Invitation not found or invalid recipient.".to_string(),
            )),
        }
    }

    /// Pending invitations addressed to `email`
    pub async fn list_pending_invitations(&self, email: &str) -> Result<Vec<Invitation>> {
        require_email(email)?;
        self.connections.pending_for(email).await
    }

    /// Everyone `email` is connected to
    pub async fn list_accepted_connections(&self, email: &str) -> Result<Vec<PublicProfile>> {
        require_email(email)?;
        self.connections.accepted_for(email).await
    }

    /// Directory minus `email` itself minus anyone it shares an edge with,
    /// whatever that edge's status. A declined pair is never suggested again.
    pub async fn suggested_users(&self, email: &str) -> Result<Vec<SuggestedUser>> {
        require_email(email)?;

        let mut excluded: HashSet<String> = self
            .connections
            .touching(email)
            .await?
            .iter()
            .map(|c| c.counterpart(email).to_string())
            .collect();
        excluded.insert(email.to_string());

        let users = self.users.list(None).await?;

        Ok(users
            .into_iter()
            .filter(|u| !excluded.contains(&u.email))
            .map(SuggestedUser::from)
            .collect())
    }
}
