//! Backend documents as stored in the search index.

use serde::{Deserialize, Serialize};

use super::types::EntityKind;

/// `{id, name}` pair embedded in film documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub imdb_rating: f64,
    #[serde(default)]
    pub genre: Option<Vec<NestedRef>>,
    #[serde(default)]
    pub actors: Option<Vec<NestedRef>>,
    #[serde(default)]
    pub writers: Option<Vec<NestedRef>>,
    #[serde(default)]
    pub director: Option<Vec<NestedRef>>,
    #[serde(default)]
    pub actors_names: Option<Vec<String>>,
    #[serde(default)]
    pub writers_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDocument {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub film_ids: Option<Vec<String>>,
}

/// A document as returned by the search backend, before assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Film(FilmDocument),
    Genre(GenreDocument),
    Person(PersonDocument),
}

impl RawRecord {
    /// Decode a document `_source` for the given kind.
    pub fn decode(kind: EntityKind, source: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Film => RawRecord::Film(serde_json::from_value(source)?),
            EntityKind::Genre => RawRecord::Genre(serde_json::from_value(source)?),
            EntityKind::Person => RawRecord::Person(serde_json::from_value(source)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            RawRecord::Film(_) => EntityKind::Film,
            RawRecord::Genre(_) => EntityKind::Genre,
            RawRecord::Person(_) => EntityKind::Person,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RawRecord::Film(doc) => &doc.id,
            RawRecord::Genre(doc) => &doc.id,
            RawRecord::Person(doc) => &doc.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn film_document_decodes_with_missing_lists() {
        let record = RawRecord::decode(
            EntityKind::Film,
            json!({"id": "f1", "title": "The Man", "imdb_rating": 8.5}),
        )
        .expect("decode");

        match record {
            RawRecord::Film(doc) => {
                assert_eq!(doc.id, "f1");
                assert!(doc.genre.is_none());
                assert!(doc.director.is_none());
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let err = RawRecord::decode(EntityKind::Person, json!({"id": "p1"}));
        assert!(err.is_err());
    }

    #[test]
    fn record_reports_kind_and_id() {
        let record = RawRecord::Genre(GenreDocument {
            id: "g1".to_string(),
            name: "Action".to_string(),
            description: None,
        });
        assert_eq!(record.kind(), EntityKind::Genre);
        assert_eq!(record.id(), "g1");
    }
}
