use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{Locale, Market, Narrative};

// ---------------------------------------------------------------------------
// MarketStore
// ---------------------------------------------------------------------------

/// In-memory snapshot of tracked markets plus cached narratives.
/// Scoring never reads through this concurrently-mutated state — callers take
/// a `snapshot()` and run the pure pass over the owned Vec.
pub struct MarketStore {
    /// market_id → Market metadata
    markets: DashMap<String, Market>,
    /// (market_id, locale) → generated narrative
    narratives: DashMap<(String, Locale), Narrative>,
}

impl MarketStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            markets: DashMap::new(),
            narratives: DashMap::new(),
        })
    }

    pub fn add_market(&self, market: Market) {
        self.markets.insert(market.id.clone(), market);
    }

    pub fn add_markets(&self, markets: Vec<Market>) {
        for market in markets {
            self.add_market(market);
        }
    }

    /// Drop a market and every narrative cached for it. A narrative response
    /// that lands after this point fails the identity check and is discarded.
    pub fn remove_market(&self, market_id: &str) {
        self.markets.remove(market_id);
        self.narratives.retain(|(id, _), _| id.as_str() != market_id);
    }

    pub fn contains_market(&self, market_id: &str) -> bool {
        self.markets.contains_key(market_id)
    }

    pub fn get_market(&self, market_id: &str) -> Option<Market> {
        self.markets.get(market_id).map(|m| m.clone())
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    pub fn all_market_ids(&self) -> Vec<String> {
        self.markets.iter().map(|e| e.key().clone()).collect()
    }

    /// Owned copy of the tracked markets for one processing pass.
    pub fn snapshot(&self) -> Vec<Market> {
        self.markets.iter().map(|e| e.value().clone()).collect()
    }

    /// Cache a narrative, but only while the market is still tracked.
    /// Returns false when the response was stale and dropped.
    pub fn put_narrative(&self, market_id: &str, locale: Locale, narrative: Narrative) -> bool {
        if !self.markets.contains_key(market_id) {
            return false;
        }
        self.narratives
            .insert((market_id.to_string(), locale), narrative);
        true
    }

    pub fn get_narrative(&self, market_id: &str, locale: Locale) -> Option<Narrative> {
        self.narratives
            .get(&(market_id.to_string(), locale))
            .map(|n| n.clone())
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self {
            markets: DashMap::new(),
            narratives: DashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_market(id: &str) -> Market {
        Market {
            id: id.to_string(),
            name: "Test".to_string(),
            protocol: "Proto".to_string(),
            symbol: "TKN".to_string(),
            expiry_ts: 1_700_000_000.0,
            implied_apy: 10.0,
            underlying_apy: 12.0,
            historical_underlying_apy: vec![11.0, 12.0],
            image_url: String::new(),
            market_url: String::new(),
            leverage: 5.0,
        }
    }

    fn test_narrative() -> Narrative {
        Narrative {
            description: "desc".to_string(),
            verdict: "verdict".to_string(),
        }
    }

    #[test]
    fn snapshot_returns_all_tracked_markets() {
        let store = MarketStore::new();
        store.add_markets(vec![test_market("a"), test_market("b")]);
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.market_count(), 2);
    }

    #[test]
    fn narrative_round_trips_per_locale() {
        let store = MarketStore::new();
        store.add_market(test_market("a"));
        assert!(store.put_narrative("a", Locale::En, test_narrative()));
        assert!(store.get_narrative("a", Locale::En).is_some());
        assert!(store.get_narrative("a", Locale::Ko).is_none());
    }

    #[test]
    fn stale_narrative_for_unknown_market_is_discarded() {
        let store = MarketStore::new();
        assert!(!store.put_narrative("ghost", Locale::En, test_narrative()));
        assert!(store.get_narrative("ghost", Locale::En).is_none());
    }

    #[test]
    fn removing_market_prunes_its_narratives() {
        let store = MarketStore::new();
        store.add_market(test_market("a"));
        store.put_narrative("a", Locale::En, test_narrative());
        store.put_narrative("a", Locale::Ko, test_narrative());

        store.remove_market("a");
        assert!(!store.contains_market("a"));
        assert!(store.get_narrative("a", Locale::En).is_none());
        assert!(store.get_narrative("a", Locale::Ko).is_none());
    }
}
