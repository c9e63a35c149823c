use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::config::Config;
use crate::fetcher::fetch_markets;
use crate::state::MarketStore;

/// Periodically re-fetches the qualifying market set and diffs it against
/// the store: new markets are added, markets that dropped out are removed
/// (which also prunes their cached narratives).
pub struct MarketRefresher {
    cfg: Config,
    store: Arc<MarketStore>,
    health: Arc<HealthState>,
}

impl MarketRefresher {
    pub fn new(cfg: Config, store: Arc<MarketStore>, health: Arc<HealthState>) -> Self {
        Self { cfg, store, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.cfg.refresh_interval_secs));
        ticker.tick().await; // skip immediate first tick — bootstrap already ran

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                error!("Market refresh failed: {e}");
            }
        }
    }

    async fn refresh(&self) -> crate::error::Result<()> {
        let (fresh_markets, stats) = fetch_markets(&self.cfg).await?;

        let current_ids: HashSet<String> = self.store.all_market_ids().into_iter().collect();
        let fresh_ids: HashSet<String> = fresh_markets.iter().map(|m| m.id.clone()).collect();

        // Currently tracked but no longer in the fresh qualifying set.
        let to_remove: Vec<String> = current_ids.difference(&fresh_ids).cloned().collect();
        let removed_count = to_remove.len();
        for market_id in &to_remove {
            self.store.remove_market(market_id);
        }

        // Upsert everything fresh: existing markets get their APYs and
        // histories replaced, new markets start being tracked.
        let added_count = fresh_ids.difference(&current_ids).count();
        self.store.add_markets(fresh_markets);

        self.health.set_last_refresh(now_secs(), added_count as u64, removed_count as u64);

        info!(
            "Market refresh: {} qualified from {} API results | +{} added, -{} removed, {} tracked",
            stats.qualified,
            stats.api_total,
            added_count,
            removed_count,
            self.store.market_count(),
        );

        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
