//! Direct-message relay
//!
//! Every message is written to the message store first; pushing it to the
//! recipient's live session comes second and may silently fail. A recipient
//! that is offline (or whose push fails) sees the message on its next
//! history fetch.

mod events;

pub use events::{ClientFrame, OutgoingMessage, ServerEvent, SessionEvent};

use crate::error::{Error, Result};
use crate::models::Message;
use crate::presence::{PresenceRegistry, SessionHandle};
use crate::store::MessageStore;
use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub struct Relay {
    messages: MessageStore,
    presence: Arc<PresenceRegistry>,
    /// Last timestamp handed out
    clock: Mutex<DateTime<Utc>>,
}

impl Relay {
    pub fn new(messages: MessageStore, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            messages,
            presence,
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    /// Receipt time, at the store's precision, never earlier than the last
    /// one issued.
    fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let mut last = self.clock.lock();
        if now > *last {
            *last = now;
        }
        *last
    }

    /// Persist a message and push it to the recipient if they are online.
    pub async fn send(&self, from_email: &str, to_email: &str, text: &str) -> Result<Message> {
        // Only absent or empty fields count as missing; whitespace is content.
        if from_email.is_empty() || to_email.is_empty() || text.is_empty() {
            return Err(Error::invalid("All fields are required"));
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            from_email: from_email.to_string(),
            to_email: to_email.to_string(),
            message: text.to_string(),
            timestamp: self.stamp(),
        };

        self.messages.insert(&message).await?;
        self.deliver(&message);

        Ok(message)
    }

    /// Best-effort live push. Returns whether the recipient's session took it.
    fn deliver(&self, message: &Message) -> bool {
        let Some(session) = self.presence.resolve(&message.to_email) else {
            debug!("[Relay] {} offline, message {} kept for history", message.to_email, message.id);
            return false;
        };

        if session.push(ServerEvent::ReceiveMessage(message.clone())) {
            debug!("[Relay] Pushed {} to session {}", message.id, session.id());
            true
        } else {
            warn!(
                "[Relay] Session {} of {} is gone, treating as offline",
                session.id(),
                message.to_email
            );
            false
        }
    }

    /// Both directions of the conversation, oldest first.
    pub async fn history(&self, user_email: &str, friend_email: &str) -> Result<Vec<Message>> {
        if user_email.is_empty() || friend_email.is_empty() {
            return Err(Error::invalid("Both userEmail and friendEmail are required"));
        }
        self.messages.between(user_email, friend_email).await
    }

    /// Apply one event from `session`.
    pub async fn handle(&self, session: &SessionHandle, event: SessionEvent) {
        match event {
            SessionEvent::Join { email } => {
                if email.trim().is_empty() {
                    warn!("[Relay] Session {} sent an empty join", session.id());
                    return;
                }
                if let Some(previous) = self.presence.join(email.clone(), session.clone()) {
                    if previous != session.id() {
                        info!("[Relay] {} rejoined, session {} superseded", email, previous);
                    }
                }
                info!("[Relay] {} joined chat on session {}", email, session.id());
            }
            SessionEvent::SendMessage(outgoing) => {
                let from_email = match present(outgoing.from_email.as_deref()) {
                    Some(from) => Some(from.to_string()),
                    None => self.presence.email_for(session.id()),
                };

                let sent = self
                    .send(
                        from_email.as_deref().unwrap_or_default(),
                        outgoing.to_email.as_deref().unwrap_or_default(),
                        outgoing.message.as_deref().unwrap_or_default(),
                    )
                    .await;

                if let Err(e) = sent {
                    warn!("[Relay] Send from session {} failed: {}", session.id(), e);
                    session.push(ServerEvent::SendFailed {
                        error: e.public_message(),
                    });
                }
            }
            SessionEvent::Disconnect => {
                for email in self.presence.remove(session.id()) {
                    info!("[Relay] {} left chat", email);
                }
            }
        }
    }
}
