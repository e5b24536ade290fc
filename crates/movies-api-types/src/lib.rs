//! Response shapes served by the movies catalog API.
//!
//! Every type here is a plain value: it is built fresh from a backend document or
//! decoded from a cached payload. Nested collections always serialize as arrays,
//! never `null`, so cached payloads stay byte-stable.

use serde::{Deserialize, Serialize};

/// Film as shown on listing and search pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmSummary {
    pub uuid: String,
    pub title: String,
    pub imdb_rating: f64,
}

/// Full film card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDetail {
    pub uuid: String,
    pub title: String,
    pub imdb_rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: Vec<FilmGenre>,
    #[serde(default)]
    pub actors: Vec<FilmPerson>,
    #[serde(default)]
    pub writers: Vec<FilmPerson>,
    #[serde(default)]
    pub directors: Vec<FilmPerson>,
}

/// Genre reference nested inside a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmGenre {
    pub uuid: String,
    pub name: String,
}

/// Person reference nested inside a film (actor, writer or director).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmPerson {
    pub uuid: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSummary {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreDetail {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Person card with roles and filmography ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetail {
    pub uuid: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Vec<String>,
    #[serde(default)]
    pub film_ids: Vec<String>,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
