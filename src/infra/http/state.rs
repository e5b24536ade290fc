use std::{sync::Arc, time::Duration};

use crate::{
    application::{
        auth::CredentialVerifier, catalog::CatalogService, flush::FlushService,
        search::SearchGateway,
    },
    cache::CacheStore,
};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: CatalogService,
    pub flush: FlushService,
    pub search: Arc<dyn SearchGateway>,
    pub cache: Arc<dyn CacheStore>,
}

impl HttpState {
    pub fn new(
        search: Arc<dyn SearchGateway>,
        cache: Arc<dyn CacheStore>,
        verifier: Arc<dyn CredentialVerifier>,
        ttl: Duration,
    ) -> Self {
        Self {
            catalog: CatalogService::new(search.clone(), cache.clone(), ttl),
            flush: FlushService::new(verifier, cache.clone()),
            search,
            cache,
        }
    }
}
