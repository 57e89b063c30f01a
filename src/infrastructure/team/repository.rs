//! In-memory team repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::team::{Team, TeamId, TeamQuery, TeamRepository};
use crate::domain::DomainError;

/// In-memory implementation of TeamRepository
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<RwLock<HashMap<TeamId, Team>>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial teams
    pub fn with_teams(teams: Vec<Team>) -> Self {
        let teams = teams.into_iter().map(|t| (*t.id(), t)).collect();

        Self {
            teams: Arc::new(RwLock::new(teams)),
        }
    }

    fn name_taken(teams: &HashMap<TeamId, Team>, team: &Team) -> bool {
        let normalized = team.name().normalized();

        teams
            .values()
            .any(|other| other.id() != team.id() && other.name().normalized() == normalized)
    }

    async fn matching(&self, query: &TeamQuery) -> Vec<Team> {
        let teams = self.teams.read().await;

        let mut result: Vec<Team> = teams.values().filter(|t| query.matches(t)).cloned().collect();
        result.sort_by_key(|t| (t.name().normalized(), *t.id().as_uuid()));
        result
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        Ok(self.teams.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let normalized = name.trim().to_lowercase();
        let teams = self.teams.read().await;

        Ok(teams
            .values()
            .find(|t| t.name().normalized() == normalized)
            .cloned())
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;

        if teams.contains_key(team.id()) {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                team.id()
            )));
        }

        if Self::name_taken(&teams, &team) {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                team.name()
            )));
        }

        teams.insert(*team.id(), team.clone());
        Ok(team)
    }

    async fn update(&self, team: Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;

        if !teams.contains_key(team.id()) {
            return Err(DomainError::not_found(format!("Team '{}' not found", team.id())));
        }

        if Self::name_taken(&teams, &team) {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                team.name()
            )));
        }

        teams.insert(*team.id(), team.clone());
        Ok(team)
    }

    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError> {
        Ok(self.teams.write().await.remove(id).is_some())
    }

    async fn list(&self, query: &TeamQuery) -> Result<Vec<Team>, DomainError> {
        Ok(query.page.slice(self.matching(query).await))
    }

    async fn count(&self, query: &TeamQuery) -> Result<usize, DomainError> {
        let teams = self.teams.read().await;
        Ok(teams.values().filter(|t| query.matches(t)).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pagination::PageRequest;
    use crate::domain::team::{FoundedYear, TeamName};

    fn team(name: &str) -> Team {
        Team::new(TeamName::new(name).unwrap(), None)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryTeamRepository::new();
        let created = repo.create(team("Arsenal")).await.unwrap();

        let fetched = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.name().as_str(), "Arsenal");
    }

    #[tokio::test]
    async fn test_create_duplicate_name_ignores_case() {
        let repo = InMemoryTeamRepository::new();
        repo.create(team("Arsenal")).await.unwrap();

        let result = repo.create(team("ARSENAL")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let repo = InMemoryTeamRepository::new();
        repo.create(team("Porto")).await.unwrap();

        assert!(repo.find_by_name(" porto ").await.unwrap().is_some());
        assert!(repo.find_by_name("Braga").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update() {
        let repo = InMemoryTeamRepository::new();
        let mut created = repo.create(team("Lazio")).await.unwrap();

        created.set_founded_year(Some(FoundedYear::new(1900).unwrap()));
        let updated = repo.update(created).await.unwrap();

        assert_eq!(updated.founded_year().map(|y| y.value()), Some(1900));
    }

    #[tokio::test]
    async fn test_update_keeping_own_name_is_allowed() {
        let repo = InMemoryTeamRepository::new();
        let mut created = repo.create(team("Roma")).await.unwrap();

        created.rename(TeamName::new("ROMA").unwrap());
        assert!(repo.update(created).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_nonexistent() {
        let repo = InMemoryTeamRepository::new();

        let result = repo.update(team("Ghost FC")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryTeamRepository::new();
        let created = repo.create(team("Napoli")).await.unwrap();

        assert!(repo.delete(created.id()).await.unwrap());
        assert!(!repo.delete(created.id()).await.unwrap());
        assert!(repo.get(created.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sorted_and_paginated() {
        let repo = InMemoryTeamRepository::with_teams(vec![
            team("Valencia"),
            team("athletic Club"),
            team("Betis"),
        ]);

        let all = repo.list(&TeamQuery::new()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|t| t.name().as_str()).collect();
        assert_eq!(names, vec!["athletic Club", "Betis", "Valencia"]);

        let page = TeamQuery::new().with_page(PageRequest::new(Some(1), Some(1)));
        let second = repo.list(&page).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name().as_str(), "Betis");
        assert_eq!(repo.count(&page).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search() {
        let repo = InMemoryTeamRepository::with_teams(vec![
            team("Manchester City"),
            team("Manchester United"),
            team("Liverpool"),
        ]);

        let query = TeamQuery::new().with_search("manchester");
        assert_eq!(repo.list(&query).await.unwrap().len(), 2);
        assert_eq!(repo.count(&query).await.unwrap(), 2);
    }
}
