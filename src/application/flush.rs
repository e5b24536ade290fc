//! Whole-cache invalidation behind a bearer token.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::{
    application::auth::{AuthError, CredentialVerifier},
    cache::{CacheError, CacheStore},
    infra::telemetry::METRIC_CACHE_FLUSH_TOTAL,
};

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Clone)]
pub struct FlushService {
    verifier: Arc<dyn CredentialVerifier>,
    cache: Arc<dyn CacheStore>,
}

impl FlushService {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, cache: Arc<dyn CacheStore>) -> Self {
        Self { verifier, cache }
    }

    /// Verify `token`, then drop every cache entry. The store is not touched
    /// unless verification succeeds.
    pub async fn flush(&self, token: Option<&str>) -> Result<(), FlushError> {
        let token = token.ok_or(AuthError::Missing)?;
        let claims = self.verifier.verify(token)?;

        self.cache.flush_all().await?;
        counter!(METRIC_CACHE_FLUSH_TOTAL).increment(1);
        info!(subject = claims.sub.as_deref().unwrap_or("-"), "cache flushed");
        Ok(())
    }
}
