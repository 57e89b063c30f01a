//! PostgreSQL team repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::team::{FoundedYear, Team, TeamId, TeamName, TeamQuery, TeamRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::{
    constraint_violation, instrumented, repository_error, ConstraintViolation,
};

const TABLE: &str = "teams";

const SELECT_COLUMNS: &str = "SELECT id, name, founded_year, created_at, updated_at FROM teams";

/// PostgreSQL implementation of TeamRepository
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql).bind(id.as_uuid()).fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to get team", e))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} WHERE LOWER(name) = LOWER($1)");
        let row = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql).bind(name.trim()).fetch_optional(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to find team by name", e))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        instrumented(
            TABLE,
            "insert",
            sqlx::query(
                r#"
                INSERT INTO teams (id, name, founded_year, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(team.id().as_uuid())
            .bind(team.name().as_str())
            .bind(team.founded_year().map(|y| y.value()))
            .bind(team.created_at())
            .bind(team.updated_at())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| write_error(&team, "Failed to create team", e))?;

        Ok(team)
    }

    async fn update(&self, team: Team) -> Result<Team, DomainError> {
        let result = instrumented(
            TABLE,
            "update",
            sqlx::query(
                r#"
                UPDATE teams
                SET name = $2, founded_year = $3, updated_at = $4
                WHERE id = $1
                "#,
            )
            .bind(team.id().as_uuid())
            .bind(team.name().as_str())
            .bind(team.founded_year().map(|y| y.value()))
            .bind(team.updated_at())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| write_error(&team, "Failed to update team", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Team '{}' not found", team.id())));
        }

        Ok(team)
    }

    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError> {
        let result = instrumented(
            TABLE,
            "delete",
            sqlx::query("DELETE FROM teams WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool),
        )
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::ForeignKey) => {
                DomainError::conflict(format!("Team '{}' still has members", id))
            }
            _ => repository_error("Failed to delete team", e),
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &TeamQuery) -> Result<Vec<Team>, DomainError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE ($1::TEXT IS NULL OR LOWER(name) LIKE $1 ESCAPE '\\') \
             ORDER BY LOWER(name), id LIMIT $2 OFFSET $3"
        );
        let rows = instrumented(
            TABLE,
            "select",
            sqlx::query(&sql)
                .bind(search_pattern(query))
                .bind(query.page.limit as i64)
                .bind(query.page.offset as i64)
                .fetch_all(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to list teams", e))?;

        rows.iter().map(row_to_team).collect()
    }

    async fn count(&self, query: &TeamQuery) -> Result<usize, DomainError> {
        let count: i64 = instrumented(
            TABLE,
            "count",
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM teams WHERE ($1::TEXT IS NULL OR LOWER(name) LIKE $1 ESCAPE '\\')",
            )
            .bind(search_pattern(query))
            .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| repository_error("Failed to count teams", e))?;

        Ok(count as usize)
    }
}

fn write_error(team: &Team, context: &str, error: sqlx::Error) -> DomainError {
    match constraint_violation(&error) {
        Some(ConstraintViolation::Unique) => {
            DomainError::conflict(format!("Team name '{}' is already taken", team.name()))
        }
        _ => repository_error(context, error),
    }
}

/// Lower-cased `LIKE` pattern for the search filter with wildcards escaped
fn search_pattern(query: &TeamQuery) -> Option<String> {
    query.search.as_ref().map(|search| {
        let escaped = search
            .trim()
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn row_to_team(row: &PgRow) -> Result<Team, DomainError> {
    let id: Uuid = row.get("id");
    let name: String = row.get("name");
    let founded_year: Option<i32> = row.get("founded_year");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let name = TeamName::new(&name)
        .map_err(|e| DomainError::repository(format!("Invalid team name in database: {}", e)))?;
    let founded_year = founded_year
        .map(FoundedYear::new)
        .transpose()
        .map_err(|e| DomainError::repository(format!("Invalid founded year in database: {}", e)))?;

    Ok(Team::restore(
        TeamId::from_uuid(id),
        name,
        founded_year,
        created_at,
        updated_at,
    ))
}
