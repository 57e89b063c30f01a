//! Database health probes

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;

/// Result of a single dependency probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub healthy: bool,
    pub latency_ms: u64,
    pub message: Option<String>,
}

/// Probe for the storage backend behind the repositories
#[async_trait]
pub trait DatabaseProbe: Send + Sync + std::fmt::Debug {
    async fn check(&self) -> ProbeResult;
}

/// Runs `SELECT 1` against the pool
#[derive(Debug, Clone)]
pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseProbe for PostgresProbe {
    async fn check(&self) -> ProbeResult {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => ProbeResult {
                healthy: true,
                latency_ms,
                message: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");

                ProbeResult {
                    healthy: false,
                    latency_ms,
                    message: Some("database unreachable".to_string()),
                }
            }
        }
    }
}

/// In-memory storage is always reachable
#[derive(Debug, Clone, Default)]
pub struct InMemoryProbe;

#[async_trait]
impl DatabaseProbe for InMemoryProbe {
    async fn check(&self) -> ProbeResult {
        ProbeResult {
            healthy: true,
            latency_ms: 0,
            message: None,
        }
    }
}
