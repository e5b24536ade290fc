use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_CACHE_HIT_TOTAL: &str = "movies_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "movies_cache_miss_total";
pub const METRIC_CACHE_STORE_TOTAL: &str = "movies_cache_store_total";
pub const METRIC_CACHE_FLUSH_TOTAL: &str = "movies_cache_flush_total";
pub const METRIC_SEARCH_MS: &str = "movies_search_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register metric descriptions with the installed recorder. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Catalog responses served from the cache store."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Catalog requests that had to query the search backend."
        );
        describe_counter!(
            METRIC_CACHE_STORE_TOTAL,
            Unit::Count,
            "Responses written to the cache store after a miss."
        );
        describe_counter!(
            METRIC_CACHE_FLUSH_TOTAL,
            Unit::Count,
            "Authorized whole-cache flushes."
        );
        describe_histogram!(
            METRIC_SEARCH_MS,
            Unit::Milliseconds,
            "Search backend call latency in milliseconds."
        );
    });
}
