//! Structured search queries.
//!
//! Turns a listing request into an Elasticsearch query body. The builder is pure:
//! identical inputs always serialize to identical bytes, which is what keeps cache
//! keys and backend requests in step.

use std::num::NonZeroU32;

use serde_json::{Map, Value, json};

use crate::domain::types::EntityKind;

/// Film sub-lists that reference persons.
const PERSON_ROLES: [&str; 3] = ["actors", "writers", "director"];
const GENRE_PATH: &str = "genre";

/// One-based page position and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: NonZeroU32,
    size: NonZeroU32,
}

impl Page {
    pub const DEFAULT_SIZE: NonZeroU32 = match NonZeroU32::new(50) {
        Some(size) => size,
        None => panic!("default page size must be non-zero"),
    };

    pub fn new(number: NonZeroU32, size: NonZeroU32) -> Self {
        Self { number, size }
    }

    pub fn number(&self) -> u32 {
        self.number.get()
    }

    pub fn size(&self) -> u32 {
        self.size.get()
    }

    /// Zero-based offset and length of the window `[(n-1)*size, n*size)`.
    pub fn window(&self) -> (u64, u64) {
        let size = u64::from(self.size.get());
        let offset = u64::from(self.number.get() - 1) * size;
        (offset, size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: NonZeroU32::MIN,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Listing-mode parameters: free text, sort, pagination and filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub query: Option<String>,
    pub sort: Option<String>,
    pub page: Page,
    pub genre: Option<String>,
    pub person: Option<String>,
}

impl Listing {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Sort key actually applied for `kind`, after defaults.
    pub fn effective_sort(&self, kind: EntityKind) -> Option<&str> {
        match (self.sort.as_deref(), self.query.is_some()) {
            (Some(key), _) => Some(key),
            (None, false) => kind.default_sort(),
            (None, true) => None,
        }
    }
}

/// Serialized search request body.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery(Value);

impl StructuredQuery {
    pub fn body(&self) -> &Value {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }
}

/// Build the search body for a listing of `kind`.
pub fn build(kind: EntityKind, listing: &Listing) -> StructuredQuery {
    let (from, size) = listing.page.window();

    let must = match listing.query.as_deref() {
        Some(text) => json!({
            "multi_match": {
                "query": text,
                "fields": kind.text_fields(),
                "fuzziness": "AUTO",
            }
        }),
        None => json!({ "match_all": {} }),
    };

    let mut filters = Vec::new();
    if let Some(genre) = listing.genre.as_deref() {
        filters.push(nested_id(GENRE_PATH, genre));
    }
    if let Some(person) = listing.person.as_deref() {
        let roles: Vec<Value> = PERSON_ROLES
            .iter()
            .map(|path| nested_id(path, person))
            .collect();
        filters.push(json!({
            "bool": {
                "should": roles,
                "minimum_should_match": 1,
            }
        }));
    }

    let mut bool_query = Map::new();
    bool_query.insert("must".to_string(), Value::Array(vec![must]));
    if !filters.is_empty() {
        bool_query.insert("filter".to_string(), Value::Array(filters));
    }

    let mut body = Map::new();
    body.insert("from".to_string(), json!(from));
    body.insert("size".to_string(), json!(size));
    body.insert("query".to_string(), json!({ "bool": bool_query }));
    if let Some(key) = listing.effective_sort(kind) {
        body.insert("sort".to_string(), Value::Array(vec![sort_clause(key)]));
    }

    StructuredQuery(Value::Object(body))
}

fn nested_id(path: &str, id: &str) -> Value {
    json!({
        "nested": {
            "path": path,
            "query": { "term": { format!("{path}.id"): id } },
        }
    })
}

fn sort_clause(key: &str) -> Value {
    let (field, order) = match key.strip_prefix('-') {
        Some(field) => (field, "desc"),
        None => (key, "asc"),
    };
    json!({ field: { "order": order } })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, size: u32) -> Page {
        Page::new(
            NonZeroU32::new(number).expect("number"),
            NonZeroU32::new(size).expect("size"),
        )
    }

    #[test]
    fn window_is_zero_based_and_exclusive() {
        assert_eq!(page(1, 50).window(), (0, 50));
        assert_eq!(page(2, 10).window(), (10, 10));
        assert_eq!(page(3, 10).window(), (20, 10));
    }

    #[test]
    fn default_page_is_first_page_of_fifty() {
        let page = Page::default();
        assert_eq!(page.number(), 1);
        assert_eq!(page.size(), 50);
        assert_eq!(Page::DEFAULT_SIZE.get(), 50);
    }

    #[test]
    fn build_is_deterministic() {
        let listing = Listing::default()
            .with_query("star")
            .with_sort("-imdb_rating")
            .with_page(page(2, 10))
            .with_genre("g1")
            .with_person("p1");

        let first = build(EntityKind::Film, &listing).to_bytes();
        let second = build(EntityKind::Film, &listing.clone()).to_bytes();
        assert_eq!(first, second);
    }

    #[test]
    fn no_text_uses_match_all_and_default_rating_sort() {
        let query = build(EntityKind::Film, &Listing::default());
        let body = query.body();

        assert_eq!(body["from"], json!(0));
        assert_eq!(body["size"], json!(50));
        assert_eq!(body["query"]["bool"]["must"][0], json!({"match_all": {}}));
        assert_eq!(body["sort"], json!([{"imdb_rating": {"order": "desc"}}]));
        assert!(body["query"]["bool"].get("filter").is_none());
    }

    #[test]
    fn free_text_without_sort_keeps_relevance_order() {
        let query = build(EntityKind::Film, &Listing::default().with_query("star"));
        let body = query.body();

        assert!(body.get("sort").is_none());
        let clause = &body["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(clause["query"], json!("star"));
        assert_eq!(clause["fuzziness"], json!("AUTO"));
        assert_eq!(clause["fields"], json!(["title^3", "description"]));
    }

    #[test]
    fn explicit_sort_direction_follows_prefix() {
        let asc = build(EntityKind::Film, &Listing::default().with_sort("imdb_rating"));
        assert_eq!(asc.body()["sort"], json!([{"imdb_rating": {"order": "asc"}}]));

        let desc = build(
            EntityKind::Film,
            &Listing::default().with_query("star").with_sort("-imdb_rating"),
        );
        assert_eq!(desc.body()["sort"], json!([{"imdb_rating": {"order": "desc"}}]));
    }

    #[test]
    fn kinds_without_rating_have_no_default_sort() {
        let query = build(EntityKind::Genre, &Listing::default());
        assert!(query.body().get("sort").is_none());
    }

    #[test]
    fn genre_filter_is_nested_membership() {
        let query = build(EntityKind::Film, &Listing::default().with_genre("g1"));
        let filter = &query.body()["query"]["bool"]["filter"];

        assert_eq!(
            filter,
            &json!([{
                "nested": {"path": "genre", "query": {"term": {"genre.id": "g1"}}}
            }])
        );
    }

    #[test]
    fn person_filter_matches_any_role() {
        let query = build(EntityKind::Film, &Listing::default().with_person("p1"));
        let filter = &query.body()["query"]["bool"]["filter"][0]["bool"];

        assert_eq!(filter["minimum_should_match"], json!(1));
        let paths: Vec<&str> = filter["should"]
            .as_array()
            .expect("should array")
            .iter()
            .map(|clause| clause["nested"]["path"].as_str().expect("path"))
            .collect();
        assert_eq!(paths, vec!["actors", "writers", "director"]);
    }

    #[test]
    fn genre_and_person_filters_are_independent_requirements() {
        let query = build(
            EntityKind::Film,
            &Listing::default().with_genre("g1").with_person("p1"),
        );
        let filters = query.body()["query"]["bool"]["filter"]
            .as_array()
            .expect("filter array");
        assert_eq!(filters.len(), 2);
    }
}
