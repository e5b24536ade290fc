use std::{process, sync::Arc, time::Duration};

use movies::{
    application::{
        auth::{CredentialVerifier, DisabledVerifier, JwtVerifier},
        error::AppError,
        search::SearchGateway,
    },
    cache::{CacheBackend, CacheConfig, CacheStore, MemoryCacheStore},
    config,
    infra::{
        elastic::ElasticsearchGateway,
        error::InfraError,
        http::{self, HttpState},
        redis::RedisCacheStore,
        telemetry,
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let search: Arc<dyn SearchGateway> =
        Arc::new(ElasticsearchGateway::new(&settings.search).map_err(AppError::from)?);
    let cache = init_cache(&settings).await?;
    let verifier = init_verifier(&settings.auth);

    let state = HttpState::new(search, cache, verifier, settings.cache.ttl);
    serve_http(&settings, state).await
}

async fn init_cache(settings: &config::Settings) -> Result<Arc<dyn CacheStore>, AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let store: Arc<dyn CacheStore> = match cache_config.backend {
        CacheBackend::Redis => {
            let store = RedisCacheStore::connect(&cache_config)
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            Arc::new(store)
        }
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(&cache_config)),
    };

    info!(
        target = "movies::cache",
        backend = ?cache_config.backend,
        ttl_secs = cache_config.ttl.as_secs(),
        "Cache store ready"
    );
    Ok(store)
}

fn init_verifier(auth: &config::AuthSettings) -> Arc<dyn CredentialVerifier> {
    match auth.secret.as_deref() {
        Some(secret) => Arc::new(JwtVerifier::new(secret.as_bytes(), auth.leeway_seconds)),
        None => {
            warn!(
                target = "movies::auth",
                "No auth secret configured; cache flush requests will be refused"
            );
            Arc::new(DisabledVerifier)
        }
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "movies::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM. A watchdog then force-exits the process if
/// in-flight requests have not drained within `grace`.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(
        target = "movies::http",
        grace_secs = grace.as_secs(),
        "Shutdown requested, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "movies::http", "Graceful shutdown timed out");
        process::exit(1);
    });
}
