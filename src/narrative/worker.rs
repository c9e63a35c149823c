use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::narrative::generator;
use crate::scorer::engine;
use crate::state::MarketStore;
use crate::types::{Locale, NarrativeRequest};

/// Receives per-market narrative requests and resolves them in the
/// background. One request's failure or latency never blocks another market,
/// and scoring never waits on this task.
pub struct NarrativeWorker {
    cfg: Config,
    store: Arc<MarketStore>,
    request_rx: mpsc::Receiver<NarrativeRequest>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
    client: reqwest::Client,
}

impl NarrativeWorker {
    pub fn new(
        cfg: Config,
        store: Arc<MarketStore>,
        request_rx: mpsc::Receiver<NarrativeRequest>,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self { cfg, store, request_rx, health, latency, client }
    }

    pub async fn run(mut self) {
        while let Some(req) = self.request_rx.recv().await {
            self.health.dec_narrative_pending();
            self.handle(req).await;
        }
    }

    async fn handle(&self, req: NarrativeRequest) {
        // Already wrote this one — no point paying for the model again.
        if self.store.get_narrative(&req.market_id, req.locale).is_some() {
            return;
        }
        let Some(market) = self.store.get_market(&req.market_id) else {
            debug!("Narrative request for untracked market {} dropped", req.market_id);
            return;
        };

        let score = engine::score(&market, req.locale).score;

        let started = Instant::now();
        let narrative =
            generator::generate(&self.client, &self.cfg, &market, score, req.locale).await;
        self.latency.record(started.elapsed());

        // The market may have been refreshed away while the model was
        // thinking; put_narrative re-checks identity and drops stale results.
        if !self.store.put_narrative(&req.market_id, req.locale, narrative) {
            debug!("Stale narrative response for {} discarded", req.market_id);
        }
    }
}

/// Enqueue a narrative request, dropping it silently when the worker is
/// saturated — the caller already holds the deterministic fallback.
pub fn try_request(
    tx: &mpsc::Sender<NarrativeRequest>,
    health: &HealthState,
    market_id: &str,
    locale: Locale,
) {
    let req = NarrativeRequest { market_id: market_id.to_string(), locale };
    if tx.try_send(req).is_ok() {
        health.inc_narrative_pending();
    }
}
