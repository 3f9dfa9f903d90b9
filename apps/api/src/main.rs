mod auth;
mod commerce;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::codes::InMemoryCodeStore;
use crate::auth::sms::LogSmsSender;
use crate::commerce::payments::StubGateway;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Kommunalka API v{}", env!("CARGO_PKG_VERSION"));

    if config.expose_debug_code {
        info!("EXPOSE_DEBUG_CODE is set: send-code responses will echo the SMS code");
    }

    // Initialize PostgreSQL and bring the schema up to date
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    info!("Database ready");

    // Build app state: injectable seams get their default implementations here
    let state = AppState {
        db,
        codes: Arc::new(InMemoryCodeStore::new()),
        sms: Arc::new(LogSmsSender),
        payments: Arc::new(StubGateway),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
