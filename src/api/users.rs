//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::middleware::{RequireAdmin, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{domain_check, double_option, ApiError, Json, Query, ValidatedJson};
use crate::domain::pagination::PageRequest;
use crate::domain::team::TeamId;
use crate::domain::user::{
    validate_password, DisplayName, Email, Role, User, UserId, UserQuery,
};
use crate::domain::DomainError;
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Request to create a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserApiRequest {
    #[validate(custom(function = "check_email"))]
    pub email: String,
    #[validate(custom(function = "check_name"))]
    pub name: String,
    #[validate(custom(function = "check_password"))]
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

/// Partial user update; `team_id: null` removes the team
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserApiRequest {
    #[validate(custom(function = "check_name"))]
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    #[validate(custom(function = "check_password"))]
    pub password: Option<String>,
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    domain_check(Email::new(email))
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    domain_check(DisplayName::new(name))
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    domain_check(validate_password(password))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersParams {
    pub role: Option<String>,
    pub team_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// User representation safe to expose
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub team_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().as_str().to_string(),
            role: user.role(),
            team_id: user.team_id().map(|t| t.to_string()),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
            last_login_at: user.last_login_at().map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::invalid_id("id", raw))
}

fn build_query(params: ListUsersParams) -> Result<UserQuery, ApiError> {
    let mut query = UserQuery::default().with_page(PageRequest::new(params.limit, params.offset));

    if let Some(role) = params.role.filter(|r| !r.trim().is_empty()) {
        let role: Role = role.parse().map_err(DomainError::from)?;
        query = query.with_role(role);
    }

    if let Some(team_id) = params.team_id.filter(|t| !t.trim().is_empty()) {
        let team_id: TeamId = team_id
            .parse()
            .map_err(|_| ApiError::invalid_id("team_id", &team_id))?;
        query = query.with_team(team_id);
    }

    Ok(query)
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let query = build_query(params)?;
    let page = state.user_service.list(query).await?;

    Ok(Json(ListUsersResponse {
        users: page.items.iter().map(UserResponse::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(request): ValidatedJson<CreateUserApiRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!(admin_id = %admin.id(), role = %request.role, "Creating user");

    let user = state
        .user_service
        .create(CreateUserRequest {
            email: request.email,
            name: request.name,
            password: request.password,
            role: request.role,
            team_id: request.team_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state.user_service.get(&id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserApiRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    debug!(admin_id = %admin.id(), user_id = %id, "Updating user");

    let user = state
        .user_service
        .update(
            &id,
            UpdateUserRequest {
                name: request.name,
                role: request.role,
                team_id: request.team_id,
                password: request.password,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_user_id(&id)?;
    debug!(admin_id = %admin.id(), user_id = %id, "Deleting user");

    state.user_service.delete(&id, admin.id()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password() {
        let user = User::new(
            Email::new("coach@club.com").unwrap(),
            DisplayName::new("Coach").unwrap(),
            "$argon2id$secret",
            Role::Manager,
            None,
        );

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["email"], "coach@club.com");
        assert_eq!(json["role"], "manager");
        assert!(json["team_id"].is_null());
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_build_query() {
        let team_id = TeamId::generate();
        let query = build_query(ListUsersParams {
            role: Some("Manager".to_string()),
            team_id: Some(team_id.to_string()),
            limit: Some(500),
            offset: Some(10),
        })
        .unwrap();

        assert_eq!(query.role, Some(Role::Manager));
        assert_eq!(query.team_id, Some(team_id));
        assert_eq!(query.page.limit, 100);
        assert_eq!(query.page.offset, 10);
    }

    #[test]
    fn test_build_query_rejects_bad_filters() {
        let err = build_query(ListUsersParams {
            role: Some("owner".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.response.error.param.as_deref(), Some("role"));

        let err = build_query(ListUsersParams {
            team_id: Some("nope".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.response.error.param.as_deref(), Some("team_id"));
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateUserApiRequest {
            email: "not-an-email".to_string(),
            name: "Coach".to_string(),
            password: "password123".to_string(),
            role: "viewer".to_string(),
            team_id: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_accepts_padded_fields() {
        let request = CreateUserApiRequest {
            email: " New@Club.com ".to_string(),
            name: "  Coach  ".to_string(),
            password: "password123".to_string(),
            role: "viewer".to_string(),
            team_id: None,
        };
        assert!(request.validate().is_ok());

        let update = UpdateUserApiRequest {
            password: Some("short".to_string()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
