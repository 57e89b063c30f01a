//! PostgreSQL user repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::team::TeamId;
use crate::domain::user::{
    DisplayName, Email, Role, User, UserId, UserQuery, UserRecord, UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::storage::{
    constraint_violation, instrumented, repository_error, ConstraintViolation,
};

const TABLE: &str = "users";

const SELECT_COLUMNS: &str = "SELECT id, email, name, password_hash, role, team_id, \
                              created_at, updated_at, last_login_at FROM users";

const FILTER: &str = "($1::TEXT IS NULL OR role = $1) AND ($2::UUID IS NULL OR team_id = $2)";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql).bind(id.as_uuid()).fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to get user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} WHERE email = $1");
        let row = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql)
                .bind(email.trim().to_lowercase())
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to get user by email", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        instrumented(
            TABLE,
            "insert",
            sqlx::query(
                r#"
                INSERT INTO users (id, email, name, password_hash, role, team_id,
                                   created_at, updated_at, last_login_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(user.id().as_uuid())
            .bind(user.email().as_str())
            .bind(user.name().as_str())
            .bind(user.password_hash())
            .bind(user.role().as_str())
            .bind(user.team_id().map(|t| *t.as_uuid()))
            .bind(user.created_at())
            .bind(user.updated_at())
            .bind(user.last_login_at())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| write_error(&user, "Failed to create user", e))?;

        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let result = instrumented(
            TABLE,
            "update",
            sqlx::query(
                r#"
                UPDATE users
                SET email = $2, name = $3, password_hash = $4, role = $5, team_id = $6,
                    updated_at = $7, last_login_at = $8
                WHERE id = $1
                "#,
            )
            .bind(user.id().as_uuid())
            .bind(user.email().as_str())
            .bind(user.name().as_str())
            .bind(user.password_hash())
            .bind(user.role().as_str())
            .bind(user.team_id().map(|t| *t.as_uuid()))
            .bind(user.updated_at())
            .bind(user.last_login_at())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| write_error(&user, "Failed to update user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("User '{}' not found", user.id())));
        }

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = instrumented(
            TABLE,
            "delete",
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} WHERE {FILTER} ORDER BY created_at, id LIMIT $3 OFFSET $4");
        let rows = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql)
                .bind(query.role.map(|r| r.as_str()))
                .bind(query.team_id.map(|t| *t.as_uuid()))
                .bind(query.page.limit as i64)
                .bind(query.page.offset as i64)
                .fetch_all(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to list users", e))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self, query: &UserQuery) -> Result<usize, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM users WHERE {FILTER}");
        let count: i64 = instrumented(
            TABLE,
            "count",
            sqlx::query_scalar(&sql)
                .bind(query.role.map(|r| r.as_str()))
                .bind(query.team_id.map(|t| *t.as_uuid()))
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to count users", e))?;

        Ok(count as usize)
    }

    async fn count_by_team(&self, team_id: &TeamId) -> Result<usize, DomainError> {
        let count: i64 = instrumented(
            TABLE,
            "count",
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE team_id = $1")
                .bind(team_id.as_uuid())
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to count team members", e))?;

        Ok(count as usize)
    }

    async fn record_login(&self, id: &UserId) -> Result<(), DomainError> {
        let result = instrumented(
            TABLE,
            "update",
            sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to record login", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        Ok(())
    }
}

fn write_error(user: &User, context: &str, error: sqlx::Error) -> DomainError {
    match constraint_violation(&error) {
        Some(ConstraintViolation::Unique) => {
            DomainError::conflict(format!("Email '{}' is already registered", user.email()))
        }
        Some(ConstraintViolation::ForeignKey) => DomainError::invalid_field(
            "team_id",
            "Team does not exist",
        ),
        None => repository_error(context, error),
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let id: Uuid = row.get("id");
    let email: String = row.get("email");
    let name: String = row.get("name");
    let role: String = row.get("role");
    let team_id: Option<Uuid> = row.get("team_id");

    let corrupt = |field: &str, e: &dyn std::fmt::Display| {
        DomainError::repository(format!("Invalid {} in database: {}", field, e))
    };

    Ok(User::restore(UserRecord {
        id: UserId::from_uuid(id),
        email: Email::new(&email).map_err(|e| corrupt("email", &e))?,
        name: DisplayName::new(&name).map_err(|e| corrupt("name", &e))?,
        password_hash: row.get("password_hash"),
        role: role.parse::<Role>().map_err(|e| corrupt("role", &e))?,
        team_id: team_id.map(TeamId::from_uuid),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
        last_login_at: row.get::<Option<DateTime<Utc>>, _>("last_login_at"),
    }))
}
