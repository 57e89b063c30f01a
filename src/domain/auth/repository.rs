//! Refresh token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use uuid::Uuid;

use super::entity::RefreshToken;
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Storage for refresh token records
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + Debug {
    /// Persist a newly issued token
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, DomainError>;

    /// Look up a token by its `jti`
    async fn get(&self, id: &Uuid) -> Result<Option<RefreshToken>, DomainError>;

    /// Delete a token, returning whether it existed
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;

    /// Revoke every token of a user, returning how many were removed
    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Remove tokens that expired at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}
