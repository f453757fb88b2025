use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod contracts;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use services::{EthersGameChain, GameChain};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "game_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting game gateway");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Chain ID: {}", config.chain_id);
    if !config.is_testnet() {
        tracing::warn!("Gateway is pointed at a non-test network; state-changing endpoints are unauthenticated");
    }

    let chain: Arc<dyn GameChain> = Arc::new(EthersGameChain::from_config(&config)?);
    tracing::info!("Owner address: {:#x}", chain.operator());
    tracing::info!(
        "Token at {:#x}, game at {:#x}",
        chain.token_address(),
        chain.game_address()
    );

    let app_state = api::AppState::new(config.clone(), chain);

    // Start background services
    services::start_background_services(app_state.clone()).await;

    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        .route("/health", get(api::health::health_check))
        // Game
        .route("/play", post(api::game::play))
        .route("/mint", get(api::game::mint))
        // Reads
        .route("/balance/{address}", get(api::balance::get_balance))
        .route("/token", get(api::balance::get_token_info))
        .route("/history/{address}", get(api::history::get_history))
        .route("/streak/{address}", get(api::history::get_streak))
        // Transaction lifecycle
        .route("/tx", get(api::transactions::list_recent))
        .route("/tx/{hash}", get(api::transactions::get_transaction))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
