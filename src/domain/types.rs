//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The three entity types served by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Film,
    Genre,
    Person,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Film, EntityKind::Genre, EntityKind::Person];

    /// Scope segment used when deriving cache keys and in route paths.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Film => "film",
            EntityKind::Genre => "genre",
            EntityKind::Person => "person",
        }
    }

    /// Document fields searched by free-text queries.
    pub fn text_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Film => &["title^3", "description"],
            EntityKind::Genre => &["name^2", "description"],
            EntityKind::Person => &["full_name"],
        }
    }

    /// Sort applied to listings that carry neither a sort key nor free text.
    ///
    /// Only films carry a rating; other kinds keep the backend order.
    pub fn default_sort(self) -> Option<&'static str> {
        match self {
            EntityKind::Film => Some("-imdb_rating"),
            EntityKind::Genre | EntityKind::Person => None,
        }
    }

    /// Message used for 404 responses.
    pub fn not_found_message(self) -> &'static str {
        match self {
            EntityKind::Film => "Film not found",
            EntityKind::Genre => "Genre not found",
            EntityKind::Person => "Person not found",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "film" => Ok(EntityKind::Film),
            "genre" => Ok(EntityKind::Genre),
            "person" => Ok(EntityKind::Person),
            other => Err(DomainError::validation(format!(
                "unknown entity kind `{other}`"
            ))),
        }
    }
}
