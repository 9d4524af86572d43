//! StreetSavvy promotions API server

use anyhow::{Context, Result};
use std::sync::Arc;
use streetsavvy_promotions::infrastructure::{InMemoryStore, PostgresStore, SystemClock};
use streetsavvy_promotions::Clock;
use streetsavvy_api::config::{ServiceConfig, StoreBackend};
use streetsavvy_api::{build_router, ApiState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env().context("load configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = match config.store {
        StoreBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            store.seed_demo_data(clock.now());
            info!("using in-memory store with demo data");
            ApiState::from_store(store, clock, config.preference_queue_capacity)
        }
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(&config.postgres)
                .await
                .with_context(|| {
                    format!(
                        "connect to postgres at {}:{}/{}",
                        config.postgres.host, config.postgres.port, config.postgres.database
                    )
                })?;
            info!(host = %config.postgres.host, database = %config.postgres.database, "using postgres store");
            ApiState::from_store(Arc::new(store), clock, config.preference_queue_capacity)
        }
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!("StreetSavvy API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
