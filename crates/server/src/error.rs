//! Error type shared by the stores, the connection manager, the relay and the
//! HTTP handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::ConnectionStatus;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or self-referential fields.
    #[error("{0}")]
    InvalidInput(String),

    /// A relationship or record that must be unique already exists.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The invitation matched but was answered before.
    #[error("Invitation already {0}.")]
    AlreadyResolved(ConnectionStatus),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored value could not be decoded (bad timestamp, bad tag list).
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyResolved(_) => StatusCode::CONFLICT,
            Error::Storage(_) | Error::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Corrupt(_))
    }

    /// Message safe to hand back to a client. Storage details stay in the log.
    pub fn public_message(&self) -> String {
        if self.is_storage() {
            "Server error".to_string()
        } else {
            self.to_string()
        }
    }
}

/// A body axum could not read as the expected JSON is the client's fault.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_storage() {
            error!("{}", self);
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
