//! Team value objects and their validation

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name must be at least {0} characters")]
    NameTooShort(usize),

    #[error("Team name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("Founded year must be between {min} and {max}")]
    FoundedYearOutOfRange { min: i32, max: i32 },
}

impl TeamValidationError {
    /// Input field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooShort(_) | Self::NameTooLong(_) => "name",
            Self::FoundedYearOutOfRange { .. } => "founded_year",
        }
    }
}

impl From<TeamValidationError> for DomainError {
    fn from(err: TeamValidationError) -> Self {
        DomainError::invalid_field(err.field(), err.to_string())
    }
}

const MIN_TEAM_NAME_LENGTH: usize = 2;
const MAX_TEAM_NAME_LENGTH: usize = 100;

/// Earliest accepted founding year; the oldest football clubs date from the 1850s
pub const MIN_FOUNDED_YEAR: i32 = 1850;

/// Team display name, trimmed, 2..=100 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, TeamValidationError> {
        let name = name.as_ref().trim();
        let len = name.chars().count();

        if len == 0 {
            return Err(TeamValidationError::EmptyName);
        }

        if len < MIN_TEAM_NAME_LENGTH {
            return Err(TeamValidationError::NameTooShort(MIN_TEAM_NAME_LENGTH));
        }

        if len > MAX_TEAM_NAME_LENGTH {
            return Err(TeamValidationError::NameTooLong(MAX_TEAM_NAME_LENGTH));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for uniqueness checks
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Year a team was founded, between 1850 and the current year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct FoundedYear(i32);

impl FoundedYear {
    pub fn new(year: i32) -> Result<Self, TeamValidationError> {
        let max = Utc::now().year();

        if !(MIN_FOUNDED_YEAR..=max).contains(&year) {
            return Err(TeamValidationError::FoundedYearOutOfRange {
                min: MIN_FOUNDED_YEAR,
                max,
            });
        }

        Ok(Self(year))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for FoundedYear {
    type Error = TeamValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FoundedYear> for i32 {
    fn from(year: FoundedYear) -> Self {
        year.0
    }
}
