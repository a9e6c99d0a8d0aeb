use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("login must not be empty")]
    EmptyLogin,

    #[error("invalid email address")]
    InvalidEmail,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Client,
    Employee,
}

/// User account. The password hash never leaves the backend: it is skipped
/// on serialization so no response or log payload can carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn new(
        login: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        email: String,
        role: Role,
    ) -> Result<Self, UserError> {
        if login.trim().is_empty() {
            return Err(UserError::EmptyLogin);
        }
        if !email.contains('@') {
            return Err(UserError::InvalidEmail);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            login,
            password_hash,
            first_name,
            last_name,
            email,
            role,
        })
    }
}

/// Verified token payload. Created per request by token verification,
/// lives for the request's duration, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: Uuid,
    pub login: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
