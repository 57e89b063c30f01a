//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Role, User, UserId};
use crate::domain::pagination::PageRequest;
use crate::domain::team::TeamId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Query parameters for listing users
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub team_id: Option<TeamId>,
    pub page: PageRequest,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Whether a user matches the filter part of this query
    pub fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role {
            if user.role() != role {
                return false;
            }
        }

        match &self.team_id {
            Some(team_id) => user.team_id() == Some(team_id),
            None => true,
        }
    }
}

/// Repository trait for user storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their email (for login)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Delete a user
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// List users ordered by creation time
    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError>;

    /// Count users matching the query filter (pagination ignored)
    async fn count(&self, query: &UserQuery) -> Result<usize, DomainError>;

    /// Count members of a team
    async fn count_by_team(&self, team_id: &TeamId) -> Result<usize, DomainError>;

    /// Record a login for a user
    async fn record_login(&self, id: &UserId) -> Result<(), DomainError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
