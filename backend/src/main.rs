use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authkeeper_backend::{
    app::{build_router, connect_store},
    config::Config,
    state::AppState,
    utils::{password::Argon2Credentials, time::SystemClock},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authkeeper_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_database_url(&config.database_url),
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_algorithm = ?config.jwt_algorithm,
        access_token_expire_minutes = config.access_token_expire_minutes,
        refresh_token_expire_days = config.refresh_token_expire_days,
        "Loaded configuration from environment/.env"
    );

    let clock = Arc::new(SystemClock);
    let store = connect_store(&config, clock.clone()).await?;
    let addr = config.bind_addr;
    let state = AppState::new(
        &config,
        store,
        Arc::new(Argon2Credentials::default()),
        clock,
    )?;

    let app = build_router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_secret(""), "<empty>");
        assert_eq!(mask_secret("supersecret"), "supe*** (len=11)");
    }

    #[test]
    fn database_credentials_are_masked() {
        assert_eq!(
            mask_database_url("postgres://user:pw@db:5432/auth"),
            "postgres://***@db:5432/auth"
        );
        assert_eq!(mask_database_url("memory://"), "memory://");
    }
}
