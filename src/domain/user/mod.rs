//! User domain
//!
//! Users authenticate with email and password and carry a role that scopes
//! what they may do. A user may be a member of one team.

mod entity;
mod repository;
mod validation;

pub use entity::{Role, User, UserId, UserRecord};
pub use repository::{UserQuery, UserRepository};
pub use validation::{validate_password, DisplayName, Email, UserValidationError};

#[cfg(test)]
pub use repository::MockUserRepository;
