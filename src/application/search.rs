//! Search backend contract consumed by the catalog.

use async_trait::async_trait;
use thiserror::Error;

use crate::{application::query::StructuredQuery, domain::entities::RawRecord, domain::types::EntityKind};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend unreachable: {0}")]
    Transport(String),
    #[error("search backend rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("search backend returned an undecodable {kind} payload: {reason}")]
    Decode { kind: EntityKind, reason: String },
}

impl SearchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(kind: EntityKind, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            kind,
            reason: err.to_string(),
        }
    }
}

/// Read access to the indexed catalog.
///
/// Absence is `Ok(None)`: a missing document, a missing index, or a search with
/// zero hits. Every other failure is an error and must never be reported as absence.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<RawRecord>, SearchError>;

    async fn search(
        &self,
        kind: EntityKind,
        query: &StructuredQuery,
    ) -> Result<Option<Vec<RawRecord>>, SearchError>;

    async fn ping(&self) -> Result<(), SearchError>;
}
