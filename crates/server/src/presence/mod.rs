//! Online presence
//!
//! Maps a user's email to the one live session that currently speaks for
//! them. Lives only as long as the process; a restart starts empty.

use crate::relay::ServerEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addressable end of a live session. Cloning shares the same outbound queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl SessionHandle {
    /// A new handle together with the receiving end the transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: SessionId::new(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue an event for the session. False once the session is gone.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[derive(Debug, Default)]
struct Sessions {
    by_email: HashMap<String, SessionHandle>,
    /// Email each session joined as most recently
    last_join: HashMap<SessionId, String>,
}

/// Presence registry: email -> live session, last join wins.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: RwLock<Sessions>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `session` as the live session for `email`. Returns the id of the
    /// session it replaced, if any.
    pub fn join(&self, email: impl Into<String>, session: SessionHandle) -> Option<SessionId> {
        let email = email.into();
        let mut sessions = self.sessions.write();
        sessions.last_join.insert(session.id, email.clone());
        sessions
            .by_email
            .insert(email, session)
            .map(|previous| previous.id)
    }

    pub fn resolve(&self, email: &str) -> Option<SessionHandle> {
        self.sessions.read().by_email.get(email).cloned()
    }

    /// Drop every entry still pointing at `id` and return their emails.
    /// Matching by handle keeps a stale disconnect from evicting a newer
    /// session of the same user.
    pub fn remove(&self, id: SessionId) -> Vec<String> {
        let mut sessions = self.sessions.write();
        sessions.last_join.remove(&id);
        let stale: Vec<String> = sessions
            .by_email
            .iter()
            .filter(|(_, session)| session.id == id)
            .map(|(email, _)| email.clone())
            .collect();
        for email in &stale {
            sessions.by_email.remove(email);
        }
        stale
    }

    /// Email the session most recently joined as, if it still speaks for it
    pub fn email_for(&self, id: SessionId) -> Option<String> {
        let sessions = self.sessions.read();
        let email = sessions.last_join.get(&id)?;
        match sessions.by_email.get(email) {
            Some(live) if live.id == id => Some(email.clone()),
            _ => None,
        }
    }

    pub fn is_online(&self, email: &str) -> bool {
        self.sessions.read().by_email.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().by_email.is_empty()
    }
}
