//! Elasticsearch adapter for the search gateway.
//!
//! Documents are fetched with `GET /{index}/_doc/{id}` and listings with
//! `POST /{index}/_search`. A 404 on either path is absence; any other non-2xx
//! status is a rejected request.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    application::{
        query::StructuredQuery,
        search::{SearchError, SearchGateway},
    },
    config::SearchSettings,
    domain::{entities::RawRecord, types::EntityKind},
};

use super::error::InfraError;

/// Rejection bodies are truncated to keep log lines bounded.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct DocResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Debug, Clone)]
pub struct ElasticsearchGateway {
    client: Client,
    base: Url,
    film_index: String,
    genre_index: String,
    person_index: String,
}

impl ElasticsearchGateway {
    pub fn new(settings: &SearchSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::search(format!("failed to build http client: {err}")))?;

        if settings.url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "search url `{}` cannot carry a path",
                settings.url
            )));
        }

        Ok(Self {
            client,
            base: settings.url.clone(),
            film_index: settings.film_index.clone(),
            genre_index: settings.genre_index.clone(),
            person_index: settings.person_index.clone(),
        })
    }

    fn index(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Film => &self.film_index,
            EntityKind::Genre => &self.genre_index,
            EntityKind::Person => &self.person_index,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::transport(format!("invalid search url `{}`", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SearchGateway for ElasticsearchGateway {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<RawRecord>, SearchError> {
        let url = self.endpoint(&[self.index(kind), "_doc", id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SearchError::transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = successful_body(response).await?;

        let doc: DocResponse =
            serde_json::from_slice(&body).map_err(|err| SearchError::decode(kind, err))?;
        match (doc.found, doc.source) {
            (true, Some(source)) => RawRecord::decode(kind, source)
                .map(Some)
                .map_err(|err| SearchError::decode(kind, err)),
            _ => Ok(None),
        }
    }

    async fn search(
        &self,
        kind: EntityKind,
        query: &StructuredQuery,
    ) -> Result<Option<Vec<RawRecord>>, SearchError> {
        let url = self.endpoint(&[self.index(kind), "_search"])?;
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(query.to_bytes())
            .send()
            .await
            .map_err(SearchError::transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = successful_body(response).await?;

        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|err| SearchError::decode(kind, err))?;
        if parsed.hits.hits.is_empty() {
            return Ok(None);
        }

        parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| RawRecord::decode(kind, hit.source))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(|err| SearchError::decode(kind, err))
    }

    async fn ping(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .map_err(SearchError::transport)?;
        successful_body(response).await.map(|_| ())
    }
}

async fn successful_body(response: Response) -> Result<bytes::Bytes, SearchError> {
    let status = response.status();
    if status.is_success() {
        return response.bytes().await.map_err(SearchError::transport);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(SearchError::Rejected {
        status: status.as_u16(),
        body,
    })
}
