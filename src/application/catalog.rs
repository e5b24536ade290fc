//! Read-through resolution of catalog requests.
//!
//! Every request is reduced to a cache key; a hit is served from the store without
//! touching the search backend, a miss fetches, assembles and stores the response.
//! Absent results are never cached and transport failures are never retried.

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use metrics::{counter, histogram};
use movies_api_types::{FilmDetail, FilmSummary, GenreDetail, GenreSummary, PersonDetail};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::form_urlencoded;

use crate::{
    application::{
        assemble,
        query::{self, Listing, StructuredQuery},
        search::{SearchError, SearchGateway},
    },
    cache::{CacheError, CacheKey, CacheStore, derive_key},
    domain::{entities::RawRecord, error::DomainError, types::EntityKind},
    infra::telemetry::{
        METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MISS_TOTAL, METRIC_CACHE_STORE_TOTAL,
        METRIC_SEARCH_MS,
    },
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("failed to encode response payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Whether a request targets one entity or a page of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMode {
    Lookup { id: String },
    Listing(Listing),
}

/// A single catalog call, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    kind: EntityKind,
    mode: RequestMode,
}

impl CatalogRequest {
    pub fn lookup(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            mode: RequestMode::Lookup { id: id.into() },
        }
    }

    pub fn listing(kind: EntityKind, listing: Listing) -> Self {
        Self {
            kind,
            mode: RequestMode::Listing(listing),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Canonical form of the request: view prefix followed by the active fields
    /// in fixed order, absent fields omitted. The sort is the one the query
    /// builder applies.
    pub fn normalized(&self) -> String {
        match &self.mode {
            RequestMode::Lookup { id } => {
                let fields = form_urlencoded::Serializer::new(String::new())
                    .append_pair("id", id)
                    .finish();
                format!("detail|{fields}")
            }
            RequestMode::Listing(listing) => {
                let mut fields = form_urlencoded::Serializer::new(String::new());
                if let Some(text) = listing.query.as_deref() {
                    fields.append_pair("q", text);
                }
                if let Some(sort) = listing.effective_sort(self.kind) {
                    fields.append_pair("sort", sort);
                }
                fields.append_pair("page[number]", &listing.page.number().to_string());
                fields.append_pair("page[size]", &listing.page.size().to_string());
                if let Some(genre) = listing.genre.as_deref() {
                    fields.append_pair("filter[genre]", genre);
                }
                if let Some(person) = listing.person.as_deref() {
                    fields.append_pair("filter[person]", person);
                }
                format!("list|{}", fields.finish())
            }
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        derive_key(self.kind.as_str(), &self.normalized())
    }
}

/// Catalog reads backed by the search gateway, fronted by the cache store.
#[derive(Clone)]
pub struct CatalogService {
    search: Arc<dyn SearchGateway>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(search: Arc<dyn SearchGateway>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { search, cache, ttl }
    }

    pub async fn film(&self, id: &str) -> Result<Option<FilmDetail>, CatalogError> {
        self.detail(EntityKind::Film, id, assemble::film_detail).await
    }

    pub async fn films(&self, listing: Listing) -> Result<Option<Vec<FilmSummary>>, CatalogError> {
        self.list(EntityKind::Film, listing, assemble::film_summary)
            .await
    }

    pub async fn genre(&self, id: &str) -> Result<Option<GenreDetail>, CatalogError> {
        self.detail(EntityKind::Genre, id, assemble::genre_detail).await
    }

    pub async fn genres(&self, listing: Listing) -> Result<Option<Vec<GenreSummary>>, CatalogError> {
        self.list(EntityKind::Genre, listing, assemble::genre_summary)
            .await
    }

    pub async fn person(&self, id: &str) -> Result<Option<PersonDetail>, CatalogError> {
        self.detail(EntityKind::Person, id, assemble::person_detail)
            .await
    }

    /// Person listings carry roles and filmography ids, same as the detail view.
    pub async fn persons(
        &self,
        listing: Listing,
    ) -> Result<Option<Vec<PersonDetail>>, CatalogError> {
        self.list(EntityKind::Person, listing, assemble::person_detail)
            .await
    }

    /// Films in which `person_id` acted, wrote or directed.
    pub async fn person_films(
        &self,
        person_id: &str,
        listing: Listing,
    ) -> Result<Option<Vec<FilmSummary>>, CatalogError> {
        self.films(listing.with_person(person_id)).await
    }

    async fn detail<T>(
        &self,
        kind: EntityKind,
        id: &str,
        project: fn(RawRecord) -> Result<T, DomainError>,
    ) -> Result<Option<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned,
    {
        let request = CatalogRequest::lookup(kind, id);
        self.read_through(&request, || self.fetch_one(kind, id, project))
            .await
    }

    async fn list<T>(
        &self,
        kind: EntityKind,
        listing: Listing,
        project: fn(RawRecord) -> Result<T, DomainError>,
    ) -> Result<Option<Vec<T>>, CatalogError>
    where
        T: Serialize + DeserializeOwned,
    {
        let query = query::build(kind, &listing);
        let request = CatalogRequest::listing(kind, listing);
        self.read_through(&request, || self.fetch_many(kind, &query, project))
            .await
    }

    async fn fetch_one<T>(
        &self,
        kind: EntityKind,
        id: &str,
        project: fn(RawRecord) -> Result<T, DomainError>,
    ) -> Result<Option<T>, CatalogError> {
        let started_at = Instant::now();
        let record = self.search.get_by_id(kind, id).await;
        record_search_latency(kind, "lookup", started_at);

        match record? {
            Some(record) => Ok(Some(project(record)?)),
            None => Ok(None),
        }
    }

    async fn fetch_many<T>(
        &self,
        kind: EntityKind,
        query: &StructuredQuery,
        project: fn(RawRecord) -> Result<T, DomainError>,
    ) -> Result<Option<Vec<T>>, CatalogError> {
        let started_at = Instant::now();
        let records = self.search.search(kind, query).await;
        record_search_latency(kind, "search", started_at);

        match records? {
            Some(records) if !records.is_empty() => Ok(Some(assemble::many(records, project)?)),
            _ => Ok(None),
        }
    }

    #[instrument(
        skip_all,
        fields(kind = %request.kind(), key = tracing::field::Empty)
    )]
    async fn read_through<T, F, Fut>(
        &self,
        request: &CatalogRequest,
        fetch: F,
    ) -> Result<Option<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, CatalogError>>,
    {
        let key = request.cache_key();
        let scope = request.kind().as_str();
        tracing::Span::current().record("key", key.as_str());

        if let Some(payload) = self.cache.get(&key).await? {
            match serde_json::from_slice::<T>(&payload) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT_TOTAL, "scope" => scope).increment(1);
                    debug!(cache = scope, outcome = "hit", "serving cached response");
                    return Ok(Some(value));
                }
                Err(err) => {
                    warn!(
                        cache = scope,
                        outcome = "corrupt",
                        error = %err,
                        "discarding undecodable cached payload"
                    );
                }
            }
        }

        counter!(METRIC_CACHE_MISS_TOTAL, "scope" => scope).increment(1);

        let Some(value) = fetch().await? else {
            debug!(cache = scope, outcome = "absent", "backend reported no results");
            return Ok(None);
        };

        let payload = serde_json::to_vec(&value).map_err(CatalogError::Encode)?;
        self.cache.set(&key, Bytes::from(payload), self.ttl).await?;
        counter!(METRIC_CACHE_STORE_TOTAL, "scope" => scope).increment(1);
        debug!(cache = scope, outcome = "stored", "caching response");

        Ok(Some(value))
    }
}

fn record_search_latency(kind: EntityKind, op: &'static str, started_at: Instant) {
    histogram!(METRIC_SEARCH_MS, "scope" => kind.as_str(), "op" => op)
        .record(started_at.elapsed().as_secs_f64() * 1000.0);
}
