use std::path::Path;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::auth;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;
use super::teams;
use super::types::ApiError;
use super::users;
use crate::config::{AppConfig, CorsConfig};
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Routes served under `/api`
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live_check))
        .nest("/auth", auth::create_auth_router())
        .nest("/teams", teams::create_teams_router())
        .nest("/users", users::create_users_router())
        .fallback(api_not_found)
}

/// Create the full application router
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    config: &AppConfig,
) -> Router {
    let mut router = Router::new()
        .nest("/api", create_api_router())
        .with_state(state);

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    if let Some(dir) = config.static_dir.as_deref() {
        let index = Path::new(dir).join("index.html");
        info!(static_dir = %dir, "Serving static files");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(cors_layer(&config.cors))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// CORS for the configured origins; `*` allows any origin
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
