mod api;
mod config;
mod error;
mod fetcher;
mod i18n;
mod market_refresh;
mod mock;
mod narrative;
mod scorer;
mod state;
mod types;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::error::Result;
use crate::fetcher::fetch_markets;
use crate::market_refresh::MarketRefresher;
use crate::narrative::NarrativeWorker;
use crate::state::MarketStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- REST bootstrap: fetch active YT markets across chains ---
    let (markets, stats) = fetch_markets(&cfg).await?;
    info!(
        "Bootstrap complete: {} markets qualified from {} API results (chains: {:?})",
        markets.len(),
        stats.api_total,
        cfg.chain_ids,
    );
    info!(
        "[FILTER] rejected: no_id={} negative_apy={} no_expiry={} | chain_errors={}",
        stats.rejected_no_id,
        stats.rejected_negative_apy,
        stats.rejected_no_expiry,
        stats.chain_errors,
    );

    // --- In-memory market store ---
    let store = MarketStore::new();
    store.add_markets(markets);

    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    health.set_last_refresh(now_secs(), store.market_count() as u64, 0);

    if cfg.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set — narratives will use the deterministic fallback only.");
    }

    // --- Channels ---
    let (narrative_tx, narrative_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // --- Spawn tasks ---

    // Narrative worker (background, per-market AI commentary)
    let narrative_worker = NarrativeWorker::new(
        cfg.clone(),
        Arc::clone(&store),
        narrative_rx,
        Arc::clone(&health),
        Arc::clone(&latency),
    );
    tokio::spawn(async move { narrative_worker.run().await });

    // Market refresher (background, every refresh_interval_secs)
    let refresher = MarketRefresher::new(cfg.clone(), Arc::clone(&store), Arc::clone(&health));
    tokio::spawn(async move { refresher.run().await });

    // --- HTTP API server ---
    let api_state = ApiState {
        store,
        narrative_tx,
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
