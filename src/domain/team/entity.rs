//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{FoundedYear, TeamName};

/// Team identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(Uuid);

impl TeamId {
    /// Generate a new random team ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::str::FromStr for TeamId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: TeamName,
    #[serde(skip_serializing_if = "Option::is_none")]
    founded_year: Option<FoundedYear>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team with a fresh identifier
    pub fn new(name: TeamName, founded_year: Option<FoundedYear>) -> Self {
        let now = Utc::now();

        Self {
            id: TeamId::generate(),
            name,
            founded_year,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a team from persisted state
    pub fn restore(
        id: TeamId,
        name: TeamName,
        founded_year: Option<FoundedYear>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            founded_year,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &TeamName {
        &self.name
    }

    pub fn founded_year(&self) -> Option<FoundedYear> {
        self.founded_year
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn rename(&mut self, name: TeamName) {
        self.name = name;
        self.touch();
    }

    pub fn set_founded_year(&mut self, founded_year: Option<FoundedYear>) {
        self.founded_year = founded_year;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
