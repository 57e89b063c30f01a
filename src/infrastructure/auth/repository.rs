//! In-memory refresh token repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::auth::{RefreshToken, RefreshTokenRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// In-memory implementation of RefreshTokenRepository
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(token.id()) {
            return Err(DomainError::conflict(format!(
                "Refresh token '{}' already exists",
                token.id()
            )));
        }

        tokens.insert(*token.id(), token.clone());
        Ok(token)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<RefreshToken>, DomainError> {
        Ok(self.tokens.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        Ok(self.tokens.write().await.remove(id).is_some())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();

        tokens.retain(|_, token| token.user_id() != user_id);

        Ok((before - tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();

        tokens.retain(|_, token| !token.is_expired_at(now));

        Ok((before - tokens.len()) as u64)
    }
}
