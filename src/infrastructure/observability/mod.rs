//! Observability infrastructure - Tracing, Metrics, and Logging

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    create_metrics_router, detached_metrics, init_metrics, record_auth_event, record_db_query,
    record_http_request, record_pool_connections, AuthEvent, Outcome, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
