use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{config::Config, types::UserId, utils::time::Clock};

/// Every decode failure collapses into this one value; callers cannot tell a
/// bad signature from an expired or malformed token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to sign token")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("token expiry is past the representable time range")]
    ExpiryOutOfRange,
}

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    pub sub: String, // user_id
    pub version: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token; `jti` names its RefreshSession row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub version: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        parse_subject(&self.sub)
    }
}

impl RefreshClaims {
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        parse_subject(&self.sub)
    }
}

/// A freshly signed refresh token plus what the caller must persist.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access and refresh tokens with one process-wide key.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        access_ttl: Duration,
        refresh_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            anyhow::bail!("Unsupported JWT algorithm {:?}; expected an HMAC algorithm", algorithm);
        }
        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            anyhow::bail!("Token lifetimes must be positive");
        }
        let now = clock.now();
        if now.checked_add_signed(access_ttl).is_none()
            || now.checked_add_signed(refresh_ttl).is_none()
        {
            anyhow::bail!("Token lifetimes exceed the representable time range");
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            clock,
        })
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Self::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.access_token_ttl()?,
            config.refresh_token_ttl()?,
            clock,
        )
    }

    pub fn issue_access(&self, subject: UserId, version: &str) -> Result<String, TokenError> {
        let now = self.clock.now();
        let expires_at = expiry(now, self.access_ttl)?;
        let claims = AccessClaims {
            sub: subject.to_string(),
            version: version.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh(
        &self,
        subject: UserId,
        version: &str,
    ) -> Result<IssuedRefreshToken, TokenError> {
        let now = self.clock.now();
        let expires_at = expiry(now, self.refresh_ttl)?;
        let claims = RefreshClaims {
            sub: subject.to_string(),
            version: version.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;

        Ok(IssuedRefreshToken {
            token,
            jti: claims.jti,
            // Truncated so the stored expiry matches the signed `exp` exactly.
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.verify(token)?;
        self.ensure_unexpired(claims.exp)?;
        Ok(claims)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.verify(token)?;
        self.ensure_unexpired(claims.exp)?;
        if claims.jti.is_empty() {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is judged against the injected clock below.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidToken)
    }

    fn ensure_unexpired(&self, exp: i64) -> Result<(), TokenError> {
        if exp <= self.clock.now().timestamp() {
            return Err(TokenError::InvalidToken);
        }
        Ok(())
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(ttl)
        .ok_or(TokenError::ExpiryOutOfRange)
}

fn parse_subject(sub: &str) -> Result<UserId, TokenError> {
    sub.parse().map_err(|_| TokenError::InvalidToken)
}
