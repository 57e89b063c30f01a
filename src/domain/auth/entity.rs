//! Stored refresh token record

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Server-side record of an issued refresh token
///
/// The id equals the `jti` claim of the token. Only a hash of the token is
/// kept so a leaked table cannot be replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    id: Uuid,
    user_id: UserId,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(
        id: Uuid,
        user_id: UserId,
        token_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            token_hash: token_hash.into(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a record from persisted state
    pub fn restore(
        id: Uuid,
        user_id: UserId,
        token_hash: String,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            token_hash,
            expires_at,
            created_at,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
