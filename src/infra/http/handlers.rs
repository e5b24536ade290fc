use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    application::{catalog::CatalogError, error::ErrorReport, query::Listing},
    domain::types::EntityKind,
};

use super::{
    error::ApiError,
    middleware::extract_bearer,
    params::{self, ListingMode, ListingQuery},
    state::HttpState,
};

type Listed = Result<Query<ListingQuery>, QueryRejection>;

#[derive(Debug, Serialize)]
struct FlushResponse {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    flushed_at: OffsetDateTime,
}

pub(super) async fn entity_detail(
    State(state): State<HttpState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind = params::parse_kind(&kind)?;
    let id = params::lookup_id(&id)?;

    match kind {
        EntityKind::Film => found(kind, state.catalog.film(&id).await),
        EntityKind::Genre => found(kind, state.catalog.genre(&id).await),
        EntityKind::Person => found(kind, state.catalog.person(&id).await),
    }
}

pub(super) async fn list_entities(
    State(state): State<HttpState>,
    Path(kind): Path<String>,
    query: Listed,
) -> Result<Response, ApiError> {
    let kind = params::parse_kind(&kind)?;
    let listing = listing(kind, query, ListingMode::Browse)?;
    list(&state, kind, listing).await
}

pub(super) async fn search_entities(
    State(state): State<HttpState>,
    Path(kind): Path<String>,
    query: Listed,
) -> Result<Response, ApiError> {
    let kind = params::parse_kind(&kind)?;
    let listing = listing(kind, query, ListingMode::Search)?;
    list(&state, kind, listing).await
}

/// Films credited to a person. Only meaningful under the `person` kind.
pub(super) async fn person_films(
    State(state): State<HttpState>,
    Path((kind, id)): Path<(String, String)>,
    query: Listed,
) -> Result<Response, ApiError> {
    if params::parse_kind(&kind)? != EntityKind::Person {
        return Err(ApiError::not_found("Resource not found"));
    }
    let id = params::lookup_id(&id)?;
    let listing = listing(EntityKind::Film, query, ListingMode::Browse)?;

    found(
        EntityKind::Film,
        state.catalog.person_films(&id, listing).await,
    )
}

pub(super) async fn flush_cache(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = extract_bearer(headers.get(AUTHORIZATION));
    state.flush.flush(token).await?;
    let body = FlushResponse {
        status: "flushed",
        flushed_at: OffsetDateTime::now_utc(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub(super) async fn health(State(state): State<HttpState>) -> Response {
    const SOURCE: &str = "infra::http::health";

    let outcome = match state.search.ping().await {
        Ok(()) => state
            .cache
            .ping()
            .await
            .map_err(|err| ErrorReport::from_error(SOURCE, StatusCode::SERVICE_UNAVAILABLE, &err)),
        Err(err) => Err(ErrorReport::from_error(
            SOURCE,
            StatusCode::SERVICE_UNAVAILABLE,
            &err,
        )),
    };

    match outcome {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(report) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            report.attach(&mut response);
            response
        }
    }
}

pub(super) async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

fn listing(kind: EntityKind, query: Listed, mode: ListingMode) -> Result<Listing, ApiError> {
    let Query(raw) = query.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    params::listing(kind, raw, mode)
}

async fn list(state: &HttpState, kind: EntityKind, listing: Listing) -> Result<Response, ApiError> {
    match kind {
        EntityKind::Film => found(kind, state.catalog.films(listing).await),
        EntityKind::Genre => found(kind, state.catalog.genres(listing).await),
        EntityKind::Person => found(kind, state.catalog.persons(listing).await),
    }
}

fn found<T: Serialize>(
    kind: EntityKind,
    result: Result<Option<T>, CatalogError>,
) -> Result<Response, ApiError> {
    match result? {
        Some(body) => Ok(Json(body).into_response()),
        None => Err(ApiError::not_found(kind.not_found_message())),
    }
}
