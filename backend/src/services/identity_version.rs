//! Per-user session epoch.
//!
//! Tokens copy the user's identity version at issue time. Replacing the
//! stored version makes every earlier token fail [`check`], with no
//! per-token server state.

use uuid::Uuid;

use crate::models::user::User;

/// Assigns a fresh random version to `user` and returns it. The caller
/// persists the change.
pub fn rotate(user: &mut User) -> Uuid {
    let next = Uuid::new_v4();
    user.identity_version = next;
    next
}

/// The string form embedded in tokens.
pub fn current(user: &User) -> String {
    user.identity_version.hyphenated().to_string()
}

/// Exact comparison of a presented version against the stored one.
pub fn check(user: &User, presented: &str) -> bool {
    current(user) == presented
}
