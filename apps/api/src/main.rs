mod config;
mod db;
mod errors;
mod extractor;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::controller::ScreeningController;
use crate::screening::registry::spawn_idle_sweeper;
use crate::state::AppState;
use crate::store::{CandidateStore, SqliteCandidateStore};

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on a missing GROQ_API_KEY
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and make sure both tables exist
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteCandidateStore::new(pool));
    store
        .init_schema()
        .await
        .context("Failed to initialize database schema")?;

    // Initialize LLM client
    let llm = LlmClient::new(
        config.groq_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
        config.llm_timeout_secs,
    )
    .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    let controller = ScreeningController::new(Arc::new(llm), store.clone());
    let state = AppState::new(controller, store);

    // Abandoned sessions are dropped after SESSION_IDLE_MINS
    spawn_idle_sweeper(
        state.sessions.clone(),
        Duration::from_secs(config.session_idle_mins * 60),
        SWEEP_PERIOD,
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
