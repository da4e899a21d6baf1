pub mod identity_version;
pub mod session_manager;
pub mod users;

pub use session_manager::SessionManager;
pub use users::UserService;

use crate::repositories::StoreError;

/// Failures of the authentication services.
///
/// Display strings are the user-visible messages; the credential and token
/// variants stay generic so they never reveal which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("Could not validate credentials")]
    InvalidAccessToken,
    #[error("Incorrect old password")]
    IncorrectOldPassword,
    #[error("Not authorized")]
    Forbidden,
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    Conflict,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Forbidden unless the authenticated actor is the target.
pub(crate) fn ensure_same_actor(
    actor: crate::types::UserId,
    target: crate::types::UserId,
) -> Result<(), AuthError> {
    if actor == target {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
