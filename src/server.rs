//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, session store setup, worker spawning, and
//! Axum server lifecycle.

use crate::config::Config;
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::persistence::{
    PgFormRepository, PgShortUrlRepository, PgVariantRepository, PgVisitRepository,
};
use crate::infrastructure::session::{
    MemoryRevocationStore, RedisRevocationStore, RevocationStore,
};
use crate::routes::app_router;
use crate::state::{AppState, Repositories, SessionSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Session revocation store (Redis, or in-process when Redis is not configured)
/// - Background visit worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Redis is configured but unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = config
        .pg_pool_options()
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let revocations = revocation_store(&config).await?;

    let pool = Arc::new(pool);
    let repositories = Repositories {
        variants: Arc::new(PgVariantRepository::new(pool.clone())),
        short_urls: Arc::new(PgShortUrlRepository::new(pool.clone())),
        forms: Arc::new(PgFormRepository::new(pool.clone())),
        visits: Arc::new(PgVisitRepository::new(pool)),
    };

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    let worker = tokio::spawn(run_visit_worker(
        visit_rx,
        repositories.visits.clone(),
        config.visit_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.visit_worker_concurrency,
        "Visit worker started"
    );

    let state = AppState::new(
        repositories,
        revocations,
        SessionSettings {
            admin_token: config.admin_token.clone(),
            secret: config.session_secret.clone(),
            max_age: config.session_max_age,
            cookie_name: config.session_cookie_name.clone(),
        },
        visit_tx,
        config.click_id_max_age_seconds,
        config.behind_proxy,
    );

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router held the last senders; the worker drains what is queued and exits.
    tracing::info!("Server stopped, flushing visit queue");
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Visit worker terminated abnormally");
    }

    Ok(())
}

async fn revocation_store(config: &Config) -> Result<Arc<dyn RevocationStore>> {
    match &config.redis_url {
        Some(redis_url) => {
            let store = RedisRevocationStore::connect(redis_url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Session revocation store: Redis");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set, session revocation is local to this instance; \
                 do not run more than one instance"
            );
            Ok(Arc::new(MemoryRevocationStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
