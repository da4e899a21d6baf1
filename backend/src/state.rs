use std::sync::Arc;

use crate::{
    config::Config,
    repositories::AuthStore,
    services::{SessionManager, UserService},
    utils::{jwt::TokenCodec, password::CredentialStore, time::Clock},
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub users: UserService,
}

impl AppState {
    /// Wires the services over one store, credential hasher and clock.
    ///
    /// Fails when the token settings in `config` are unusable.
    pub fn new(
        config: &Config,
        store: Arc<dyn AuthStore>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let codec = Arc::new(TokenCodec::from_config(config, clock.clone())?);
        let sessions = SessionManager::new(store.clone(), codec, credentials.clone(), clock);
        let users = UserService::new(store, credentials);
        Ok(Self {
            sessions,
            users,
        })
    }
}
