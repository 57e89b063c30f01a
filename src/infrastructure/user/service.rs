//! User service for user management

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::auth::RefreshTokenRepository;
use crate::domain::pagination::Page;
use crate::domain::team::{TeamId, TeamRepository};
use crate::domain::user::{
    validate_password, DisplayName, Email, Role, User, UserId, UserQuery, UserRepository,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub team_id: Option<Uuid>,
}

/// Partial user update
///
/// `team_id: Some(None)` removes the user from their team.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub team_id: Option<Option<Uuid>>,
    pub password: Option<String>,
}

/// User management use cases
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    tokens: Arc<dyn RefreshTokenRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        teams: Arc<dyn TeamRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            teams,
            tokens,
            hasher,
        }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let email = Email::new(&request.email)?;
        let name = DisplayName::new(&request.name)?;
        let role: Role = request.role.parse()?;
        validate_password(&request.password)?;

        let team_id = match request.team_id {
            Some(id) => Some(self.existing_team(id).await?),
            None => None,
        };

        if self.users.get_by_email(email.as_str()).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self
            .users
            .create(User::new(email, name, password_hash, role, team_id))
            .await?;

        info!(user_id = %user.id(), role = %user.role(), "Created user");

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: &UserId) -> Result<User, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    /// List one page of users
    pub async fn list(&self, query: UserQuery) -> Result<Page<User>, DomainError> {
        let items = self.users.list(&query).await?;
        let total = self.users.count(&query).await?;

        Ok(Page::new(items, total, query.page))
    }

    /// Apply a partial update; a password change signs the user out everywhere
    pub async fn update(&self, id: &UserId, request: UpdateUserRequest) -> Result<User, DomainError> {
        let mut user = self.get(id).await?;

        if let Some(name) = request.name {
            user.set_name(DisplayName::new(&name)?);
        }

        if let Some(role) = request.role {
            user.set_role(role.parse()?);
        }

        if let Some(team_id) = request.team_id {
            let team_id = match team_id {
                Some(id) => Some(self.existing_team(id).await?),
                None => None,
            };
            user.set_team(team_id);
        }

        let password_changed = match request.password {
            Some(password) => {
                validate_password(&password)?;
                user.set_password_hash(self.hasher.hash(&password)?);
                true
            }
            None => false,
        };

        let user = self.users.update(user).await?;

        if password_changed {
            let revoked = self.tokens.delete_for_user(user.id()).await?;
            info!(user_id = %user.id(), revoked, "Password changed, refresh tokens revoked");
        } else {
            info!(user_id = %user.id(), "Updated user");
        }

        Ok(user)
    }

    /// Delete a user other than the acting one
    pub async fn delete(&self, id: &UserId, acting_user: &UserId) -> Result<(), DomainError> {
        if id == acting_user {
            return Err(DomainError::validation("You cannot delete your own account"));
        }

        self.get(id).await?;
        self.tokens.delete_for_user(id).await?;

        if !self.users.delete(id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        info!(user_id = %id, "Deleted user");

        Ok(())
    }

    /// Create an admin when no user exists yet
    ///
    /// Returns `None` when users are already present.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        if self.users.count(&UserQuery::new()).await? > 0 {
            return Ok(None);
        }

        warn!(email = %email, "No users found, creating bootstrap admin");

        self.create(CreateUserRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Admin.as_str().to_string(),
            team_id: None,
        })
        .await
        .map(Some)
    }

    async fn existing_team(&self, id: Uuid) -> Result<TeamId, DomainError> {
        let team_id = TeamId::from_uuid(id);

        if !self.teams.exists(&team_id).await? {
            return Err(DomainError::invalid_field(
                "team_id",
                format!("Team '{}' does not exist", team_id),
            ));
        }

        Ok(team_id)
    }
}
