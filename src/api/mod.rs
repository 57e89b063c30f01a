//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod teams;
pub mod types;
pub mod users;

pub use router::{create_api_router, create_router};
pub use state::AppState;
