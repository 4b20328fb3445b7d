//! Crate error types.

use thiserror::Error;

/// Errors raised by collaborators and supporting services.
///
/// These never represent a form being invalid; field-level problems are
/// recorded on the form itself.
#[derive(Debug, Error)]
pub enum ManageError {
    #[error("internal error")]
    Internal(#[from] anyhow::Error),

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error("invalid TOTP secret: {0}")]
    InvalidSecret(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("email '{0}' is already in use")]
    EmailTaken(String),

    #[error("unknown user {0}")]
    UnknownUser(uuid::Uuid),

    #[error("http error")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using ManageError.
pub type ManageResult<T> = Result<T, ManageError>;
