//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::team::TeamId;
use crate::domain::user::{User, UserId, UserQuery, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserStore {
    users: HashMap<UserId, User>,
    /// Email -> user ID lookup
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<UserStore>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let mut store = UserStore::default();

        for user in users {
            store
                .email_index
                .insert(user.email().as_str().to_string(), *user.id());
            store.users.insert(*user.id(), user);
        }

        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.store.read().await.users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let store = self.store.read().await;
        let email = email.trim().to_lowercase();

        Ok(store
            .email_index
            .get(&email)
            .and_then(|id| store.users.get(id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut store = self.store.write().await;
        let email = user.email().as_str().to_string();

        if store.users.contains_key(user.id()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }

        if store.email_index.contains_key(&email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        store.email_index.insert(email, *user.id());
        store.users.insert(*user.id(), user.clone());

        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut store = self.store.write().await;

        let Some(existing) = store.users.get(user.id()) else {
            return Err(DomainError::not_found(format!("User '{}' not found", user.id())));
        };

        let old_email = existing.email().as_str().to_string();
        let new_email = user.email().as_str().to_string();

        if old_email != new_email {
            if store.email_index.contains_key(&new_email) {
                return Err(DomainError::conflict(format!(
                    "Email '{}' is already registered",
                    new_email
                )));
            }

            store.email_index.remove(&old_email);
            store.email_index.insert(new_email, *user.id());
        }

        store.users.insert(*user.id(), user.clone());

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut store = self.store.write().await;

        match store.users.remove(id) {
            Some(user) => {
                store.email_index.remove(user.email().as_str());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError> {
        let store = self.store.read().await;

        let mut users: Vec<User> = store
            .users
            .values()
            .filter(|u| query.matches(u))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at(), *u.id().as_uuid()));

        Ok(query.page.slice(users))
    }

    async fn count(&self, query: &UserQuery) -> Result<usize, DomainError> {
        let store = self.store.read().await;
        Ok(store.users.values().filter(|u| query.matches(u)).count())
    }

    async fn count_by_team(&self, team_id: &TeamId) -> Result<usize, DomainError> {
        let store = self.store.read().await;

        Ok(store
            .users
            .values()
            .filter(|u| u.team_id() == Some(team_id))
            .count())
    }

    async fn record_login(&self, id: &UserId) -> Result<(), DomainError> {
        let mut store = self.store.write().await;

        let user = store
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;

        user.record_login();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{DisplayName, Email, Role};

    fn create_test_user(email: &str, role: Role, team_id: Option<TeamId>) -> User {
        User::new(
            Email::new(email).unwrap(),
            DisplayName::new("Test User").unwrap(),
            "hash",
            role,
            team_id,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("coach@club.com", Role::Manager, None);

        repo.create(user.clone()).await.unwrap();

        let fetched = repo.get(user.id()).await.unwrap().unwrap();
        assert_eq!(fetched.email().as_str(), "coach@club.com");
    }

    #[tokio::test]
    async fn test_get_by_email_normalizes() {
        let repo = InMemoryUserRepository::new();
        repo.create(create_test_user("coach@club.com", Role::Viewer, None))
            .await
            .unwrap();

        assert!(repo.get_by_email(" Coach@Club.com ").await.unwrap().is_some());
        assert!(repo.get_by_email("other@club.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(create_test_user("coach@club.com", Role::Viewer, None))
            .await
            .unwrap();

        let result = repo
            .create(create_test_user("coach@club.com", Role::Admin, None))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update() {
        let repo = InMemoryUserRepository::new();
        let mut user = create_test_user("coach@club.com", Role::Viewer, None);
        repo.create(user.clone()).await.unwrap();

        user.set_role(Role::Manager);
        repo.update(user.clone()).await.unwrap();

        let fetched = repo.get(user.id()).await.unwrap().unwrap();
        assert_eq!(fetched.role(), Role::Manager);
    }

    #[tokio::test]
    async fn test_update_nonexistent() {
        let repo = InMemoryUserRepository::new();
        let result = repo
            .update(create_test_user("ghost@club.com", Role::Viewer, None))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_frees_email() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("coach@club.com", Role::Viewer, None);
        repo.create(user.clone()).await.unwrap();

        assert!(repo.delete(user.id()).await.unwrap());
        assert!(!repo.delete(user.id()).await.unwrap());
        assert!(repo.get_by_email("coach@club.com").await.unwrap().is_none());

        repo.create(create_test_user("coach@club.com", Role::Viewer, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_and_counts() {
        let team_id = TeamId::generate();
        let repo = InMemoryUserRepository::with_users(vec![
            create_test_user("a@club.com", Role::Admin, None),
            create_test_user("b@club.com", Role::Viewer, Some(team_id)),
            create_test_user("c@club.com", Role::Viewer, Some(team_id)),
        ]);

        let viewers = UserQuery::new().with_role(Role::Viewer);
        assert_eq!(repo.list(&viewers).await.unwrap().len(), 2);
        assert_eq!(repo.count(&UserQuery::new()).await.unwrap(), 3);
        assert_eq!(repo.count_by_team(&team_id).await.unwrap(), 2);
        assert_eq!(repo.count_by_team(&TeamId::generate()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_login() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("coach@club.com", Role::Viewer, None);
        repo.create(user.clone()).await.unwrap();

        repo.record_login(user.id()).await.unwrap();

        let fetched = repo.get(user.id()).await.unwrap().unwrap();
        assert!(fetched.last_login_at().is_some());
    }

    #[tokio::test]
    async fn test_record_login_unknown_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.record_login(&UserId::generate()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
