//! PostgreSQL connection pool and query instrumentation

use std::future::Future;
use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::watch;

use crate::config::DatabaseConfig;
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_db_query, record_pool_connections, Outcome};

/// Interval between connection pool gauge samples
pub const POOL_SAMPLE_INTERVAL: Duration = Duration::from_secs(15);

/// PostgreSQL SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Open a connection pool using the database settings
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::repository(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// Run a query future and record its duration and outcome
pub async fn instrumented<T, F>(
    table: &'static str,
    operation: &'static str,
    query: F,
) -> Result<T, sqlx::Error>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;

    record_db_query(table, operation, Outcome::of(&result), start.elapsed());

    result
}

/// Classification of driver errors the repositories care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    ForeignKey,
}

/// Return the violated constraint kind, if the error is one
pub fn constraint_violation(error: &sqlx::Error) -> Option<ConstraintViolation> {
    let db_error = error.as_database_error()?;

    match db_error.code().as_deref() {
        Some(UNIQUE_VIOLATION) => Some(ConstraintViolation::Unique),
        Some(FOREIGN_KEY_VIOLATION) => Some(ConstraintViolation::ForeignKey),
        _ => None,
    }
}

/// Map a driver error to a repository error with context
pub fn repository_error(context: &str, error: sqlx::Error) -> DomainError {
    DomainError::repository(format!("{}: {}", context, error))
}

/// Publish pool occupancy gauges until shutdown is signalled
pub async fn sample_pool_connections(pool: PgPool, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(POOL_SAMPLE_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let idle = pool.num_idle();
                let size = pool.size() as usize;
                record_pool_connections(idle, size.saturating_sub(idle));
            }
            _ = shutdown.changed() => {
                tracing::debug!("Stopping connection pool sampler");
                break;
            }
        }
    }
}
