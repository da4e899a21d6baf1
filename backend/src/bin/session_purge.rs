//! Deletes refresh sessions whose expiry has passed.
//!
//! Expired rows are already rejected on use; this only reclaims space.

use std::sync::Arc;

use authkeeper_backend::{
    app::connect_store,
    config::Config,
    utils::time::{Clock, SystemClock},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_purge=info,authkeeper_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let clock = Arc::new(SystemClock);
    let store = connect_store(&config, clock.clone()).await?;

    let mut tx = store.begin().await?;
    let deleted = tx.purge_expired_sessions(clock.now()).await?;
    tx.commit().await?;

    tracing::info!(deleted_sessions = deleted, "Expired refresh sessions purged");
    Ok(())
}
