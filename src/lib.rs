//! TeamPulse API
//!
//! Football team management with role-scoped users:
//! - Email/password login with JWT access and rotating refresh tokens
//! - Teams and users backed by PostgreSQL or in-memory storage
//! - Prometheus metrics and structured logging

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use rand::Rng;
use sqlx::PgPool;
use tracing::info;

use api::state::AppState;
use crate::config::StorageBackend;
use domain::{DomainError, RefreshTokenRepository, TeamRepository, UserRepository};
use infrastructure::{
    auth::{
        AuthService, InMemoryRefreshTokenRepository, JwtConfig, JwtService,
        PostgresRefreshTokenRepository,
    },
    storage::{self, DatabaseProbe, InMemoryProbe, PostgresMigrator, PostgresProbe},
    team::{InMemoryTeamRepository, PostgresTeamRepository, TeamService},
    user::{Argon2Hasher, InMemoryUserRepository, PasswordHasher, PostgresUserRepository, UserService},
};

/// Repositories behind the services, for one storage backend
pub struct Repositories {
    pub teams: Arc<dyn TeamRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn RefreshTokenRepository>,
    pub probe: Arc<dyn DatabaseProbe>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            tokens: Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
            probe: Arc::new(PostgresProbe::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            teams: Arc::new(InMemoryTeamRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            tokens: Arc::new(InMemoryRefreshTokenRepository::new()),
            probe: Arc::new(InMemoryProbe),
        }
    }
}

/// Wire services on top of the given repositories
pub fn assemble_state(
    repositories: Repositories,
    hasher: Arc<dyn PasswordHasher>,
    config: &AppConfig,
) -> Result<AppState, DomainError> {
    let issuer = Arc::new(JwtService::new(JwtConfig::from_settings(&config.auth)?));

    let team_service = TeamService::new(repositories.teams.clone(), repositories.users.clone());
    let user_service = UserService::new(
        repositories.users.clone(),
        repositories.teams,
        repositories.tokens.clone(),
        hasher.clone(),
    );
    let auth_service = AuthService::new(repositories.users, repositories.tokens, hasher, issuer);

    Ok(AppState::new(
        Arc::new(team_service),
        Arc::new(user_service),
        Arc::new(auth_service),
        repositories.probe,
    ))
}

/// Application state backed by in-memory repositories
pub fn create_in_memory_state(config: &AppConfig) -> Result<AppState, DomainError> {
    assemble_state(Repositories::in_memory(), Arc::new(Argon2Hasher::new()), config)
}

/// Create the application state for the configured backend.
///
/// Returns the pool as well when the backend is PostgreSQL; migrations run
/// first when `database.run_migrations` is set.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<(AppState, Option<PgPool>)> {
    match config.database.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            Ok((create_in_memory_state(config)?, None))
        }
        StorageBackend::Postgres => {
            let pool = storage::connect(&config.database).await?;

            if config.database.run_migrations {
                let applied = PostgresMigrator::new(pool.clone()).run().await?;
                info!(applied, "Database migrations complete");
            }

            let state = assemble_state(
                Repositories::postgres(pool.clone()),
                Arc::new(Argon2Hasher::new()),
                config,
            )?;

            Ok((state, Some(pool)))
        }
    }
}

/// Seed the first admin from configuration when no user exists
pub async fn bootstrap_admin(state: &AppState, config: &AppConfig) -> anyhow::Result<()> {
    let Some(email) = config.auth.bootstrap_admin_email.as_deref() else {
        return Ok(());
    };

    let (password, generated) = match config.auth.bootstrap_admin_password.as_deref() {
        Some(p) if !p.is_empty() => (p.to_string(), false),
        _ => (generate_password(), true),
    };

    let created = state
        .user_service
        .bootstrap_admin(email, &config.auth.bootstrap_admin_name, &password)
        .await?;

    if let Some(admin) = created {
        info!("===========================================");
        info!("Initial admin user created: {}", admin.email());
        if generated {
            info!("Password: {}", password);
            info!("Please change this password after first login.");
        } else {
            info!("Password: (set via auth.bootstrap_admin_password)");
        }
        info!("===========================================");
    }

    Ok(())
}

/// Random alphanumeric password for generated admin accounts
pub fn generate_password() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password() {
        let password = generate_password();
        assert_eq!(password.len(), 20);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let mut config = AppConfig::in_memory();
        config.auth.bootstrap_admin_email = Some("admin@club.com".to_string());
        config.auth.bootstrap_admin_password = Some("password123".to_string());

        let state = assemble_state(
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::low_cost()),
            &config,
        )
        .unwrap();

        bootstrap_admin(&state, &config).await.unwrap();
        bootstrap_admin(&state, &config).await.unwrap();

        let page = state
            .user_service
            .list(domain::UserQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].role(), domain::Role::Admin);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_skipped_without_email() {
        let config = AppConfig::in_memory();
        let state = assemble_state(
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::low_cost()),
            &config,
        )
        .unwrap();

        bootstrap_admin(&state, &config).await.unwrap();

        let page = state
            .user_service
            .list(domain::UserQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_assemble_state_rejects_unusable_token_lifetime() {
        let mut config = AppConfig::in_memory();
        config.auth.access_ttl_secs = u64::MAX;

        let result = assemble_state(
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::low_cost()),
            &config,
        );
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
