//! Team service for team management

use std::sync::Arc;

use tracing::info;

use crate::domain::pagination::Page;
use crate::domain::team::{FoundedYear, Team, TeamId, TeamName, TeamQuery, TeamRepository};
use crate::domain::user::UserRepository;
use crate::domain::DomainError;

/// Request for creating a new team
#[derive(Debug, Clone)]
pub struct CreateTeamRequest {
    pub name: String,
    pub founded_year: Option<i32>,
}

/// Partial team update
///
/// `founded_year: Some(None)` clears the year, `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub founded_year: Option<Option<i32>>,
}

/// Team use cases
#[derive(Debug, Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { teams, users }
    }

    /// Create a new team with a unique name
    pub async fn create(&self, request: CreateTeamRequest) -> Result<Team, DomainError> {
        let name = TeamName::new(&request.name)?;
        let founded_year = request.founded_year.map(FoundedYear::new).transpose()?;

        self.ensure_name_available(&name, None).await?;

        let team = self.teams.create(Team::new(name, founded_year)).await?;

        info!(team_id = %team.id(), name = %team.name(), "Created team");

        Ok(team)
    }

    /// Get a team by ID
    pub async fn get(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
    }

    /// List one page of teams
    pub async fn list(&self, query: TeamQuery) -> Result<Page<Team>, DomainError> {
        let items = self.teams.list(&query).await?;
        let total = self.teams.count(&query).await?;

        Ok(Page::new(items, total, query.page))
    }

    /// Apply a partial update to a team
    pub async fn update(&self, id: &TeamId, request: UpdateTeamRequest) -> Result<Team, DomainError> {
        let mut team = self.get(id).await?;

        if let Some(name) = request.name {
            let name = TeamName::new(&name)?;
            self.ensure_name_available(&name, Some(id)).await?;
            team.rename(name);
        }

        if let Some(founded_year) = request.founded_year {
            team.set_founded_year(founded_year.map(FoundedYear::new).transpose()?);
        }

        let team = self.teams.update(team).await?;

        info!(team_id = %team.id(), "Updated team");

        Ok(team)
    }

    /// Delete a team without members
    pub async fn delete(&self, id: &TeamId) -> Result<(), DomainError> {
        self.get(id).await?;

        let members = self.users.count_by_team(id).await?;
        if members > 0 {
            return Err(DomainError::conflict(format!(
                "Team '{}' still has {} member(s)",
                id, members
            )));
        }

        if !self.teams.delete(id).await? {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        info!(team_id = %id, "Deleted team");

        Ok(())
    }

    async fn ensure_name_available(
        &self,
        name: &TeamName,
        except: Option<&TeamId>,
    ) -> Result<(), DomainError> {
        match self.teams.find_by_name(name.as_str()).await? {
            Some(existing) if Some(existing.id()) != except => Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                name
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::MockTeamRepository;
    use crate::domain::user::{DisplayName, Email, MockUserRepository, Role, User};
    use crate::infrastructure::team::InMemoryTeamRepository;
    use crate::infrastructure::user::InMemoryUserRepository;

    fn create_service() -> (TeamService, Arc<InMemoryUserRepository>) {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = TeamService::new(Arc::new(InMemoryTeamRepository::new()), users.clone());
        (service, users)
    }

    fn request(name: &str, founded_year: Option<i32>) -> CreateTeamRequest {
        CreateTeamRequest {
            name: name.to_string(),
            founded_year,
        }
    }

    #[tokio::test]
    async fn test_create_team() {
        let (service, _) = create_service();

        let team = service.create(request("  Celtic ", Some(1887))).await.unwrap();
        assert_eq!(team.name().as_str(), "Celtic");
        assert_eq!(team.founded_year().map(|y| y.value()), Some(1887));
    }

    #[tokio::test]
    async fn test_create_team_invalid_name() {
        let (service, _) = create_service();

        let result = service.create(request("X", None)).await;
        match result {
            Err(DomainError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("name")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_team_invalid_year() {
        let (service, _) = create_service();

        let result = service.create(request("Old Boys", Some(1700))).await;
        match result {
            Err(DomainError::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("founded_year"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let (service, _) = create_service();
        service.create(request("Everton", None)).await.unwrap();

        let result = service.create(request("everton", None)).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_get_missing_team() {
        let (service, _) = create_service();

        let result = service.get(&TeamId::generate()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_reports_total() {
        let (service, _) = create_service();
        for name in ["Alpha", "Bravo", "Charlie"] {
            service.create(request(name, None)).await.unwrap();
        }

        let query = TeamQuery::new().with_page(crate::domain::PageRequest::new(Some(2), None));
        let page = service.list(query).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.limit, 2);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (service, _) = create_service();
        let team = service.create(request("Hearts", Some(1874))).await.unwrap();

        let renamed = service
            .update(
                team.id(),
                UpdateTeamRequest {
                    name: Some("Heart of Midlothian".to_string()),
                    founded_year: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name().as_str(), "Heart of Midlothian");
        assert_eq!(renamed.founded_year().map(|y| y.value()), Some(1874));

        let cleared = service
            .update(
                team.id(),
                UpdateTeamRequest {
                    name: None,
                    founded_year: Some(None),
                },
            )
            .await
            .unwrap();
        assert!(cleared.founded_year().is_none());
    }

    #[tokio::test]
    async fn test_update_to_taken_name() {
        let (service, _) = create_service();
        service.create(request("Hibernian", None)).await.unwrap();
        let team = service.create(request("Aberdeen", None)).await.unwrap();

        let result = service
            .update(
                team.id(),
                UpdateTeamRequest {
                    name: Some("HIBERNIAN".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_keeps_own_name() {
        let (service, _) = create_service();
        let team = service.create(request("Dundee", None)).await.unwrap();

        let result = service
            .update(
                team.id(),
                UpdateTeamRequest {
                    name: Some("DUNDEE".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(result.unwrap().name().as_str(), "DUNDEE");
    }

    #[tokio::test]
    async fn test_delete_team() {
        let (service, _) = create_service();
        let team = service.create(request("Motherwell", None)).await.unwrap();

        service.delete(team.id()).await.unwrap();

        assert!(matches!(
            service.get(team.id()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_team_with_members() {
        let (service, users) = create_service();
        let team = service.create(request("Kilmarnock", None)).await.unwrap();

        users
            .create(User::new(
                Email::new("fan@kilmarnock.com").unwrap(),
                DisplayName::new("Fan").unwrap(),
                "hash",
                Role::Viewer,
                Some(*team.id()),
            ))
            .await
            .unwrap();

        let result = service.delete(team.id()).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert!(service.get(team.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let mut teams = MockTeamRepository::new();
        teams
            .expect_find_by_name()
            .returning(|_| Err(DomainError::repository("connection reset")));
        teams.expect_create().never();

        let service = TeamService::new(Arc::new(teams), Arc::new(MockUserRepository::new()));

        let result = service.create(request("St Mirren", None)).await;
        assert!(matches!(result, Err(DomainError::Repository { .. })));
    }

    #[tokio::test]
    async fn test_delete_checks_membership_before_deleting() {
        let team = Team::new(TeamName::new("Ross County").unwrap(), None);
        let team_id = *team.id();

        let mut teams = MockTeamRepository::new();
        teams
            .expect_get()
            .returning(move |_| Ok(Some(team.clone())));
        teams.expect_delete().never();

        let mut users = MockUserRepository::new();
        users
            .expect_count_by_team()
            .withf(move |id| id.as_uuid() == team_id.as_uuid())
            .times(1)
            .returning(|_| Ok(2));

        let service = TeamService::new(Arc::new(teams), Arc::new(users));

        let result = service.delete(&team_id).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }
}
