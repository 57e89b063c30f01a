//! Application state for shared services

use std::sync::Arc;
use std::time::Instant;

use crate::infrastructure::auth::AuthService;
use crate::infrastructure::storage::DatabaseProbe;
use crate::infrastructure::team::TeamService;
use crate::infrastructure::user::UserService;

/// Shared services handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub team_service: Arc<TeamService>,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub database_probe: Arc<dyn DatabaseProbe>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        team_service: Arc<TeamService>,
        user_service: Arc<UserService>,
        auth_service: Arc<AuthService>,
        database_probe: Arc<dyn DatabaseProbe>,
    ) -> Self {
        Self {
            team_service,
            user_service,
            auth_service,
            database_probe,
            started_at: Instant::now(),
        }
    }
}
