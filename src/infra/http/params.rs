//! Query-string validation for catalog listings.
//!
//! Numeric and identifier parameters are taken as strings so every malformed
//! value produces the same 422 body instead of an extractor rejection.

use std::num::NonZeroU32;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::query::{Listing, Page},
    domain::types::EntityKind,
};

use super::error::ApiError;

pub const MAX_PAGE_SIZE: u32 = 100;
/// Deepest hit, `from + size`, the search backend will page to.
pub const MAX_RESULT_WINDOW: u64 = 10_000;
const RATING_SORTS: [&str; 2] = ["imdb_rating", "-imdb_rating"];

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub query: Option<String>,
    pub sort: Option<String>,
    #[serde(rename = "page[number]")]
    pub page_number: Option<String>,
    #[serde(rename = "page[size]")]
    pub page_size: Option<String>,
    #[serde(rename = "filter[genre]")]
    pub genre: Option<String>,
    #[serde(rename = "filter[person]")]
    pub person: Option<String>,
}

/// Browse listings ignore free text; search listings require it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Browse,
    Search,
}

pub fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found("Resource not found"))
}

pub fn lookup_id(raw: &str) -> Result<String, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::unprocessable("id must not be blank"));
    }
    Ok(id.to_string())
}

pub fn listing(
    kind: EntityKind,
    raw: ListingQuery,
    mode: ListingMode,
) -> Result<Listing, ApiError> {
    let number = positive(raw.page_number.as_deref(), "page[number]", 1, u32::MAX)?;
    let size = positive(
        raw.page_size.as_deref(),
        "page[size]",
        Page::DEFAULT_SIZE.get(),
        MAX_PAGE_SIZE,
    )?;
    let page = Page::new(number, size);
    let (offset, limit) = page.window();
    if offset + limit > MAX_RESULT_WINDOW {
        return Err(ApiError::unprocessable(format!(
            "page[number] * page[size] must not exceed {MAX_RESULT_WINDOW}"
        )));
    }
    let mut listing = Listing::default().with_page(page);

    if mode == ListingMode::Search {
        let text = raw
            .query
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ApiError::unprocessable("query must not be blank"))?;
        listing = listing.with_query(text);
    }

    if let Some(sort) = non_blank(raw.sort.as_deref()) {
        if kind != EntityKind::Film {
            return Err(ApiError::unprocessable(format!(
                "sort is not supported for {kind} listings"
            )));
        }
        if !RATING_SORTS.contains(&sort) {
            return Err(ApiError::unprocessable(
                "sort must be one of imdb_rating, -imdb_rating",
            ));
        }
        listing = listing.with_sort(sort);
    }

    let genre = non_blank(raw.genre.as_deref())
        .map(|value| uuid_filter(value, "filter[genre]"))
        .transpose()?;
    let person = non_blank(raw.person.as_deref())
        .map(|value| uuid_filter(value, "filter[person]"))
        .transpose()?;
    if (genre.is_some() || person.is_some()) && kind != EntityKind::Film {
        return Err(ApiError::unprocessable(format!(
            "filters are not supported for {kind} listings"
        )));
    }
    if let Some(genre) = genre {
        listing = listing.with_genre(genre);
    }
    if let Some(person) = person {
        listing = listing.with_person(person);
    }

    Ok(listing)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn positive(
    raw: Option<&str>,
    name: &'static str,
    default: u32,
    max: u32,
) -> Result<NonZeroU32, ApiError> {
    let value = match non_blank(raw) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            ApiError::unprocessable(format!("{name} must be a positive integer"))
        })?,
        None => default,
    };
    if value > max {
        return Err(ApiError::unprocessable(format!(
            "{name} must not exceed {max}"
        )));
    }
    NonZeroU32::new(value)
        .ok_or_else(|| ApiError::unprocessable(format!("{name} must be at least 1")))
}

/// Filters are normalized to lowercase hyphenated form so equivalent spellings
/// share a cache key.
fn uuid_filter(value: &str, name: &'static str) -> Result<String, ApiError> {
    Uuid::parse_str(value)
        .map(|uuid| uuid.to_string())
        .map_err(|_| ApiError::unprocessable(format!("{name} must be a UUID")))
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;
    use axum::http::{StatusCode, Uri};

    use super::*;

    const GENRE: &str = "6c162475-c7ed-4461-9184-001ef3d9f26e";

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        let uri: Uri = format!("/catalog/film?{encoded}").parse().expect("uri");
        Query::<ListingQuery>::try_from_uri(&uri)
            .expect("decode query")
            .0
    }

    #[test]
    fn defaults_to_first_page_of_fifty() {
        let listing = listing(EntityKind::Film, ListingQuery::default(), ListingMode::Browse)
            .expect("valid");
        assert_eq!(listing.page.number(), 1);
        assert_eq!(listing.page.size(), 50);
        assert!(listing.sort.is_none());
    }

    #[test]
    fn bracketed_names_are_recognized() {
        let listing = listing(
            EntityKind::Film,
            query(&[
                ("page[number]", "2"),
                ("page[size]", "10"),
                ("filter[genre]", GENRE),
                ("sort", "-imdb_rating"),
            ]),
            ListingMode::Browse,
        )
        .expect("valid");

        assert_eq!(listing.page.window(), (10, 10));
        assert_eq!(listing.genre.as_deref(), Some(GENRE));
        assert_eq!(listing.sort.as_deref(), Some("-imdb_rating"));
    }

    #[test]
    fn parameter_order_does_not_change_listing() {
        let a = listing(
            EntityKind::Film,
            query(&[("sort", "imdb_rating"), ("page[size]", "5"), ("filter[genre]", GENRE)]),
            ListingMode::Browse,
        )
        .expect("valid");
        let b = listing(
            EntityKind::Film,
            query(&[("filter[genre]", GENRE), ("sort", "imdb_rating"), ("page[size]", "5")]),
            ListingMode::Browse,
        )
        .expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn uuid_filters_are_normalized() {
        let upper = GENRE.to_uppercase();
        let listing = listing(
            EntityKind::Film,
            query(&[("filter[genre]", upper.as_str())]),
            ListingMode::Browse,
        )
        .expect("valid");
        assert_eq!(listing.genre.as_deref(), Some(GENRE));
    }

    #[test]
    fn page_bounds_are_enforced() {
        for pairs in [
            [("page[number]", "0")],
            [("page[size]", "0")],
            [("page[size]", "101")],
            [("page[number]", "-1")],
            [("page[number]", "abc")],
        ] {
            let err = listing(EntityKind::Film, query(&pairs), ListingMode::Browse)
                .expect_err("invalid page");
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn pages_past_the_result_window_are_rejected() {
        let err = listing(
            EntityKind::Film,
            query(&[("page[number]", "201"), ("page[size]", "50")]),
            ListingMode::Browse,
        )
        .expect_err("beyond window");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = listing(
            EntityKind::Film,
            query(&[("page[number]", &u32::MAX.to_string())]),
            ListingMode::Browse,
        )
        .expect_err("beyond window");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let last = listing(
            EntityKind::Film,
            query(&[("page[number]", "200"), ("page[size]", "50")]),
            ListingMode::Browse,
        )
        .expect("last page inside window");
        let (offset, size) = last.page.window();
        assert_eq!(offset + size, MAX_RESULT_WINDOW);
    }

    #[test]
    fn unknown_sort_is_rejected() {
        let err = listing(
            EntityKind::Film,
            query(&[("sort", "title")]),
            ListingMode::Browse,
        )
        .expect_err("invalid sort");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn sort_and_filters_are_film_only() {
        assert!(
            listing(
                EntityKind::Genre,
                query(&[("sort", "-imdb_rating")]),
                ListingMode::Browse
            )
            .is_err()
        );
        assert!(
            listing(
                EntityKind::Person,
                query(&[("filter[genre]", GENRE)]),
                ListingMode::Browse
            )
            .is_err()
        );
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let err = listing(
            EntityKind::Film,
            query(&[("filter[person]", "not-a-uuid")]),
            ListingMode::Browse,
        )
        .expect_err("invalid filter");
        assert_eq!(err.code(), super::super::error::codes::UNPROCESSABLE);
    }

    #[test]
    fn search_requires_text() {
        assert!(listing(EntityKind::Person, query(&[]), ListingMode::Search).is_err());
        assert!(
            listing(EntityKind::Person, query(&[("query", "   ")]), ListingMode::Search).is_err()
        );

        let listing = listing(
            EntityKind::Person,
            query(&[("query", " Tarkovsky ")]),
            ListingMode::Search,
        )
        .expect("valid");
        assert_eq!(listing.query.as_deref(), Some("Tarkovsky"));
    }

    #[test]
    fn browse_ignores_free_text() {
        let listing = listing(
            EntityKind::Film,
            query(&[("query", "star")]),
            ListingMode::Browse,
        )
        .expect("valid");
        assert!(listing.query.is_none());
    }

    #[test]
    fn unknown_kind_is_not_found() {
        let err = parse_kind("films").expect_err("unknown kind");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
