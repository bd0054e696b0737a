//! Error types for the user directory.

use broadside_protocol::UserId;

/// Errors that can occur while registering or looking up users.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The name is taken and the password does not match.
    #[error("wrong password for user {0:?}")]
    AuthFailed(String),

    /// The name or password is unusable (for example, empty).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// No user with this id exists.
    #[error("user {0} not found")]
    NotFound(UserId),
}
