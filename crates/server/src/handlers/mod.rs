//! HTTP and WebSocket handlers

pub mod connections;
mod extract;
pub mod messages;
pub mod presence;
pub mod users;
pub mod ws;

// Re-export AppState from config
pub use crate::config::AppState;
pub use extract::JsonBody;

// Connection handlers
pub use connections::{
    list_invitations, my_connections, respond_to_invitation, send_connection_request,
    suggested_users,
};

// Message history
pub use messages::{get_messages, post_message};

// Presence probe
pub use presence::get_presence;

// User directory
pub use users::{
    create_user, delete_user, get_user_by_email, list_all_users, list_users, patch_user,
    update_user,
};

// Live session transport
pub use ws::session_ws;
