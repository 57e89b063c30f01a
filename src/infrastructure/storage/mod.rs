//! Storage infrastructure - connection pool, migrations and health probes

mod health;
pub mod migrations;
mod postgres;

pub use migrations::{schema_migrations, PostgresMigrator};
pub use health::{DatabaseProbe, InMemoryProbe, PostgresProbe, ProbeResult};
pub use postgres::{
    connect, constraint_violation, instrumented, repository_error, sample_pool_connections,
    ConstraintViolation, POOL_SAMPLE_INTERVAL,
};

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_migrator_builds_over_lazy_pool() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/teampulse")
            .unwrap();

        let migrator = PostgresMigrator::new(pool);
        let debug = format!("{:?}", migrator);

        assert!(debug.starts_with("PostgresMigrator"));
        for migration in schema_migrations() {
            assert!(debug.contains(migration.description));
        }
    }
}
