//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId};
use crate::domain::pagination::PageRequest;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Query parameters for listing teams
#[derive(Debug, Clone, Default)]
pub struct TeamQuery {
    /// Case-insensitive substring match on the team name
    pub search: Option<String>,
    pub page: PageRequest,
}

impl TeamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Whether a team matches the filter part of this query
    pub fn matches(&self, team: &Team) -> bool {
        match &self.search {
            Some(search) => team
                .name()
                .normalized()
                .contains(&search.trim().to_lowercase()),
            None => true,
        }
    }
}

/// Repository for managing teams
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by ID
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError>;

    /// Find a team by name, ignoring case
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError>;

    /// Create a new team
    async fn create(&self, team: Team) -> Result<Team, DomainError>;

    /// Update an existing team
    async fn update(&self, team: Team) -> Result<Team, DomainError>;

    /// Delete a team by ID
    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError>;

    /// List teams ordered by name
    async fn list(&self, query: &TeamQuery) -> Result<Vec<Team>, DomainError>;

    /// Count teams matching the query filter (pagination ignored)
    async fn count(&self, query: &TeamQuery) -> Result<usize, DomainError>;

    /// Check if a team exists
    async fn exists(&self, id: &TeamId) -> Result<bool, DomainError> {
        Ok(self.get(id).await?.is_some())
    }
}
