use anyhow::{anyhow, Context};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::{env, net::SocketAddr, str::FromStr};

const MEMORY_DATABASE_PREFIX: &str = "memory:";
const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 7 * 24 * 60;
const MAX_REFRESH_TOKEN_EXPIRE_DAYS: u64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: u64,
    pub refresh_token_expire_days: u64,
    pub bind_addr: SocketAddr,
    pub run_migrations: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/authkeeper".to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET must be set to a non-empty value"))?;

        let jwt_algorithm = parse_or(&lookup, "JWT_ALGORITHM", Algorithm::HS256)?;
        if !matches!(
            jwt_algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(anyhow!(
                "Invalid JWT_ALGORITHM value: {:?} (expected HS256, HS384 or HS512)",
                jwt_algorithm
            ));
        }

        let access_token_expire_minutes = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        let refresh_token_expire_days = parse_or(&lookup, "REFRESH_TOKEN_EXPIRE_DAYS", 7)?;
        if access_token_expire_minutes == 0 || refresh_token_expire_days == 0 {
            return Err(anyhow!("Token lifetimes must be greater than zero"));
        }
        if access_token_expire_minutes > MAX_ACCESS_TOKEN_EXPIRE_MINUTES {
            return Err(anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be at most {}",
                MAX_ACCESS_TOKEN_EXPIRE_MINUTES
            ));
        }
        if refresh_token_expire_days > MAX_REFRESH_TOKEN_EXPIRE_DAYS {
            return Err(anyhow!(
                "REFRESH_TOKEN_EXPIRE_DAYS must be at most {}",
                MAX_REFRESH_TOKEN_EXPIRE_DAYS
            ));
        }

        Ok(Config {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            database_acquire_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                5,
            )?,
            jwt_secret,
            jwt_algorithm,
            access_token_expire_minutes,
            refresh_token_expire_days,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// True when `DATABASE_URL` selects the in-process store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_PREFIX)
    }

    pub fn access_token_ttl(&self) -> anyhow::Result<Duration> {
        i64::try_from(self.access_token_expire_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| anyhow!("ACCESS_TOKEN_EXPIRE_MINUTES is out of range"))
    }

    pub fn refresh_token_ttl(&self) -> anyhow::Result<Duration> {
        i64::try_from(self.refresh_token_expire_days)
            .ok()
            .and_then(Duration::try_days)
            .ok_or_else(|| anyhow!("REFRESH_TOKEN_EXPIRE_DAYS is out of range"))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
    }
}
