//! Domain layer - Core business logic and entities

pub mod auth;
pub mod error;
pub mod pagination;
pub mod team;
pub mod user;

pub use auth::{RefreshToken, RefreshTokenRepository};
pub use error::DomainError;
pub use pagination::{Page, PageRequest};
pub use team::{FoundedYear, Team, TeamId, TeamName, TeamQuery, TeamRepository};
pub use user::{DisplayName, Email, Role, User, UserId, UserQuery, UserRepository};
