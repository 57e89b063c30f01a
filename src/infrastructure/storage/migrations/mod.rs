//! Versioned schema migrations recorded in `_migrations`

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// A reversible schema change
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// Applies and reverts migrations against PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

impl PostgresMigrator {
    /// Migrator over the TeamPulse schema
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, schema_migrations())
    }

    pub fn with_migrations(pool: PgPool, migrations: Vec<Migration>) -> Self {
        Self { pool, migrations }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::repository(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply every pending migration in version order, returning how many ran
    pub async fn run(&self) -> Result<usize, DomainError> {
        let current = self.current_version().await?.unwrap_or(0);
        let mut applied = 0;

        for migration in self.migrations.iter().filter(|m| m.version > current) {
            self.apply(migration).await?;
            applied += 1;
        }

        Ok(applied)
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::repository(format!("Failed to start migration transaction: {}", e))
        })?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::repository(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::repository(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::repository(format!(
                "Failed to commit migration {}: {}",
                migration.version, e
            ))
        })?;

        info!(version = migration.version, description = migration.description, "Applied migration");

        Ok(())
    }

    /// Revert the latest applied migration, returning its version
    pub async fn revert(&self) -> Result<Option<i64>, DomainError> {
        let Some(current) = self.current_version().await? else {
            return Ok(None);
        };

        let migration = self
            .migrations
            .iter()
            .find(|m| m.version == current)
            .ok_or_else(|| {
                DomainError::configuration(format!("Unknown applied migration version {}", current))
            })?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::repository(format!("Failed to start migration transaction: {}", e))
        })?;

        sqlx::raw_sql(migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::repository(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::repository(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::repository(format!(
                "Failed to commit revert of {}: {}",
                migration.version, e
            ))
        })?;

        info!(version = migration.version, description = migration.description, "Reverted migration");

        Ok(Some(migration.version))
    }

    /// Latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM _migrations WHERE success = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::repository(format!("Failed to get migration version: {}", e)))
    }
}

/// Schema of teams, users and refresh tokens
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create teams table",
            up: r#"
            CREATE TABLE IF NOT EXISTS teams (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                founded_year INTEGER,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_teams_name_lower ON teams (LOWER(name));
            "#,
            down: "DROP TABLE IF EXISTS teams;",
        },
        Migration {
            version: 2,
            description: "Create users table",
            up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email VARCHAR(254) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                password_hash TEXT NOT NULL,
                role VARCHAR(16) NOT NULL CHECK (role IN ('admin', 'manager', 'viewer')),
                team_id UUID REFERENCES teams(id) ON DELETE RESTRICT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_login_at TIMESTAMPTZ
            );
            CREATE INDEX IF NOT EXISTS idx_users_team_id ON users (team_id);
            CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at);
            "#,
            down: "DROP TABLE IF EXISTS users;",
        },
        Migration {
            version: 3,
            description: "Create refresh_tokens table",
            up: r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens (user_id);
            CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires_at ON refresh_tokens (expires_at);
            "#,
            down: "DROP TABLE IF EXISTS refresh_tokens;",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = schema_migrations();

        assert!(!migrations.is_empty());

        for pair in migrations.windows(2) {
            assert!(
                pair[1].version > pair[0].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_migrations_have_content() {
        for migration in schema_migrations() {
            assert!(!migration.description.is_empty());
            assert!(!migration.up.trim().is_empty());
            assert!(!migration.down.trim().is_empty());
        }
    }

    #[test]
    fn test_foreign_key_rules() {
        let migrations = schema_migrations();
        let users = &migrations[1];
        let tokens = &migrations[2];

        assert!(users.up.contains("REFERENCES teams(id) ON DELETE RESTRICT"));
        assert!(tokens.up.contains("REFERENCES users(id) ON DELETE CASCADE"));
    }
}
