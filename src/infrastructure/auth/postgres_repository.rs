//! PostgreSQL refresh token repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::auth::{RefreshToken, RefreshTokenRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::storage::{
    constraint_violation, instrumented, repository_error, ConstraintViolation,
};

const TABLE: &str = "refresh_tokens";

/// PostgreSQL implementation of RefreshTokenRepository
#[derive(Debug, Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        instrumented(
            TABLE,
            "insert",
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(token.id())
            .bind(token.user_id().as_uuid())
            .bind(token.token_hash())
            .bind(token.expires_at())
            .bind(token.created_at())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::Unique) => {
                DomainError::conflict(format!("Refresh token '{}' already exists", token.id()))
            }
            Some(ConstraintViolation::ForeignKey) => {
                DomainError::not_found(format!("User '{}' not found", token.user_id()))
            }
            None => repository_error("Failed to store refresh token", e),
        })?;

        Ok(token)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<RefreshToken>, DomainError> {
        let row = instrumented(
            TABLE,
            "select",
            sqlx::query(
                "SELECT id, user_id, token_hash, expires_at, created_at \
                 FROM refresh_tokens WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to get refresh token", e))?;

        Ok(row.as_ref().map(row_to_token))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        let result = instrumented(
            TABLE,
            "delete",
            sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to delete refresh token", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = instrumented(
            TABLE,
            "delete",
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .execute(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to revoke refresh tokens", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = instrumented(
            TABLE,
            "delete",
            sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
                .bind(now)
                .execute(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to purge refresh tokens", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_token(row: &PgRow) -> RefreshToken {
    RefreshToken::restore(
        row.get("id"),
        UserId::from_uuid(row.get("user_id")),
        row.get("token_hash"),
        row.get("expires_at"),
        row.get("created_at"),
    )
}
