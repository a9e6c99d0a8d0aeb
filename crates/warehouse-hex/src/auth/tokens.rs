//! Signed, time-limited identity tokens (HS256 JWT).
//!
//! Verification is strict about the algorithm: a token whose header names
//! anything but HS256 (including "none") fails before the payload is
//! looked at. Every failure cause (malformed token, wrong algorithm, bad
//! signature, expired) is logged with its specific reason but collapses
//! into one uniform `Unauthorized` on the wire, so callers cannot probe
//! which check tripped.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use warehouse_types::domain::user::{Claims, Role};

pub const DEFAULT_TTL_SECS: i64 = 3600;

const REJECTION: &str = "invalid or expired token";

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: Uuid,
    login: String,
    role: Role,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        login: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let payload = TokenPayload {
            sub: user_id,
            login: login.to_owned(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding).map_err(|e| {
            AppError::internal("failed to issue token").with_cause(anyhow::anyhow!("{e}"))
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;

        let data = decode::<TokenPayload>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(cause = %e, "token rejected");
            AppError::unauthorized(REJECTION)
        })?;

        let payload = data.claims;
        let issued_at = DateTime::from_timestamp(payload.iat, 0);
        let expires_at = DateTime::from_timestamp(payload.exp, 0);
        let (issued_at, expires_at) = match (issued_at, expires_at) {
            (Some(iat), Some(exp)) => (iat, exp),
            _ => {
                tracing::debug!("token rejected: timestamps out of range");
                return Err(AppError::unauthorized(REJECTION));
            }
        };
        if expires_at <= now {
            tracing::debug!(%expires_at, "token rejected: expired");
            return Err(AppError::unauthorized(REJECTION));
        }

        Ok(Claims {
            user_id: payload.sub,
            login: payload.login,
            role: payload.role,
            issued_at,
            expires_at,
        })
    }
}
