//! Error handling for the Marquee CMS backend

use std::fmt;
use thiserror::Error;

/// Unified error type for the Marquee CMS backend
#[derive(Error, Debug)]
pub enum Error {
    /// The admin token was missing, malformed, or failed a check.
    /// Deliberately carries no detail about which check failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// Input failed server-side validation; the message is user-facing
    #[error("Validation error: {0}")]
    Validation(String),

    /// The bot-challenge token could not be verified
    #[error("Verification failed")]
    Verification,

    /// Mail delivery failed; the submission can be retried
    #[error("Mail error: {0}")]
    Mail(String),

    /// A feature is switched off because its configuration is incomplete
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] marquee_firestore::FirestoreError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] marquee_storage::StorageError),

    /// Content resolution or publishing errors
    #[error("Content error: {0}")]
    Content(#[from] marquee_content::ContentError),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<marquee_auth::AuthError> for Error {
    fn from(_: marquee_auth::AuthError) -> Self {
        Error::Unauthorized
    }
}

impl From<marquee_content::ValidationError> for Error {
    fn from(err: marquee_content::ValidationError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new mail error
    pub fn mail<T: fmt::Display>(msg: T) -> Self {
        Error::Mail(msg.to_string())
    }

    /// Create a new unavailable-feature error
    pub fn unavailable<T: fmt::Display>(msg: T) -> Self {
        Error::Unavailable(msg.to_string())
    }
}
