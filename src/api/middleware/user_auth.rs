//! Bearer-token authentication extractors and role guards

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::{Role, User};

/// Extractor that requires a valid access token
///
/// The token is read from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let user = state.auth_service.authenticate_access(&token).await?;
        debug!(user_id = %user.id(), role = %user.role(), "Authenticated request");

        Ok(RequireUser(user))
    }
}

/// Extractor for routes reserved to managers and admins
#[derive(Debug, Clone)]
pub struct RequireManager(pub User);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Manager)?;
        Ok(RequireManager(user))
    }
}

/// Extractor for routes reserved to admins
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(RequireAdmin(user))
    }
}

/// Check that a user's role grants at least `minimum`
pub fn require_role(user: &User, minimum: Role) -> Result<(), ApiError> {
    if user.role().includes(minimum) {
        return Ok(());
    }

    debug!(user_id = %user.id(), role = %user.role(), required = %minimum, "Insufficient role");
    Err(ApiError::forbidden(format!(
        "This action requires the '{}' role",
        minimum
    )))
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide an access token via 'Authorization: Bearer <token>'",
    ))
}
