//! Team domain module
//!
//! Teams are the football clubs managed by TeamPulse. Users may belong to
//! at most one team.

mod entity;
mod repository;
mod validation;

pub use entity::{Team, TeamId};
pub use repository::{TeamQuery, TeamRepository};
pub use validation::{FoundedYear, TeamName, TeamValidationError, MIN_FOUNDED_YEAR};

#[cfg(test)]
pub use repository::MockTeamRepository;
