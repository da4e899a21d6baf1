//! Data models shared across database access and API handlers.

pub mod refresh_session;
pub mod user;
