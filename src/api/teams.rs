//! Team endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::api::middleware::{RequireAdmin, RequireManager, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{domain_check, double_option, ApiError, Json, Query, ValidatedJson};
use crate::domain::pagination::PageRequest;
use crate::domain::team::{Team, TeamId, TeamName, TeamQuery};
use crate::infrastructure::team::{CreateTeamRequest, UpdateTeamRequest};

pub fn create_teams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route(
            "/{id}",
            get(get_team).patch(update_team).delete(delete_team),
        )
}

/// Request to create a team
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamApiRequest {
    #[validate(custom(function = "check_team_name"))]
    pub name: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
}

/// Partial team update; `founded_year: null` clears the year
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTeamApiRequest {
    #[validate(custom(function = "check_team_name"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub founded_year: Option<Option<i32>>,
}

fn check_team_name(name: &str) -> Result<(), ValidationError> {
    domain_check(TeamName::new(name))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTeamsParams {
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id().to_string(),
            name: team.name().to_string(),
            founded_year: team.founded_year().map(|y| y.value()),
            created_at: team.created_at().to_rfc3339(),
            updated_at: team.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTeamsResponse {
    pub teams: Vec<TeamResponse>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

fn parse_team_id(raw: &str) -> Result<TeamId, ApiError> {
    raw.parse().map_err(|_| ApiError::invalid_id("id", raw))
}

/// GET /api/teams
pub async fn list_teams(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Query(params): Query<ListTeamsParams>,
) -> Result<Json<ListTeamsResponse>, ApiError> {
    let mut query = TeamQuery::new().with_page(PageRequest::new(params.limit, params.offset));
    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        query = query.with_search(search);
    }

    let page = state.team_service.list(query).await?;

    Ok(Json(ListTeamsResponse {
        teams: page.items.iter().map(TeamResponse::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    ValidatedJson(request): ValidatedJson<CreateTeamApiRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    debug!(user_id = %user.id(), name = %request.name, "Creating team");

    let team = state
        .team_service
        .create(CreateTeamRequest {
            name: request.name,
            founded_year: request.founded_year,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// GET /api/teams/{id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let id = parse_team_id(&id)?;
    let team = state.team_service.get(&id).await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// PATCH /api/teams/{id}
pub async fn update_team(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateTeamApiRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let id = parse_team_id(&id)?;
    debug!(user_id = %user.id(), team_id = %id, "Updating team");

    let team = state
        .team_service
        .update(
            &id,
            UpdateTeamRequest {
                name: request.name,
                founded_year: request.founded_year,
            },
        )
        .await?;

    Ok(Json(TeamResponse::from(&team)))
}

/// DELETE /api/teams/{id}
pub async fn delete_team(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_team_id(&id)?;
    debug!(user_id = %user.id(), team_id = %id, "Deleting team");

    state.team_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
