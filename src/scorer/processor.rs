//! Scores a market list and applies tier filtering and score ordering.
//! Stateless: filter, sort direction, and locale arrive as explicit
//! parameters on every call and the pass is recomputed from scratch.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::scorer::engine;
use crate::types::{Locale, Market, ScoredMarket, SortDirection, TierFilter};

/// Score, filter, and sort against the wall clock. "Now" is read once for
/// the whole pass so every record is judged at the same instant.
pub fn process(
    markets: &[Market],
    tier_filter: TierFilter,
    sort: SortDirection,
    locale: Locale,
) -> Vec<ScoredMarket> {
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    process_at(markets, tier_filter, sort, locale, now_secs)
}

/// Deterministic variant with an explicit "now".
pub fn process_at(
    markets: &[Market],
    tier_filter: TierFilter,
    sort: SortDirection,
    locale: Locale,
    now_secs: f64,
) -> Vec<ScoredMarket> {
    let mut scored: Vec<ScoredMarket> = markets
        .iter()
        .map(|market| ScoredMarket {
            market: market.clone(),
            scoring: engine::score_at(market, locale, now_secs),
        })
        .filter(|sm| match tier_filter {
            TierFilter::All => true,
            TierFilter::Only(tier) => sm.scoring.tier == tier,
        })
        .collect();

    // Vec::sort_by is stable, so equal scores keep their input order.
    match sort {
        SortDirection::Descending => scored.sort_by(|a, b| b.scoring.score.cmp(&a.scoring.score)),
        SortDirection::Ascending => scored.sort_by(|a, b| a.scoring.score.cmp(&b.scoring.score)),
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;

    const NOW: f64 = 1_700_000_000.0;

    fn market(id: &str, implied: f64, underlying: f64, days_out: f64) -> Market {
        Market {
            id: id.to_string(),
            name: format!("Market {id}"),
            protocol: "Proto".to_string(),
            symbol: "TKN".to_string(),
            expiry_ts: NOW + days_out * 86_400.0,
            implied_apy: implied,
            underlying_apy: underlying,
            historical_underlying_apy: vec![underlying, underlying],
            image_url: String::new(),
            market_url: String::new(),
            leverage: 5.0,
        }
    }

    fn sample() -> Vec<Market> {
        vec![
            market("strong", 10.0, 16.0, 120.0), // big positive spread
            market("weak", 25.0, 15.0, 45.0),    // negative spread
            market("mid", 10.0, 11.5, 90.0),     // small positive spread
            market("mid_twin", 10.0, 11.5, 90.0),
        ]
    }

    #[test]
    fn all_filter_keeps_every_record() {
        let markets = sample();
        let out = process_at(&markets, TierFilter::All, SortDirection::Descending, Locale::En, NOW);
        assert_eq!(out.len(), markets.len());
    }

    #[test]
    fn tier_filter_is_exact() {
        let markets = sample();
        for tier in Tier::ALL {
            let out = process_at(
                &markets,
                TierFilter::Only(tier),
                SortDirection::Descending,
                Locale::En,
                NOW,
            );
            assert!(out.iter().all(|sm| sm.scoring.tier == tier));
        }
    }

    #[test]
    fn descending_sort_orders_by_score() {
        let markets = sample();
        let out = process_at(&markets, TierFilter::All, SortDirection::Descending, Locale::En, NOW);
        for pair in out.windows(2) {
            assert!(pair[0].scoring.score >= pair[1].scoring.score);
        }
    }

    #[test]
    fn ascending_sort_orders_by_score() {
        let markets = sample();
        let out = process_at(&markets, TierFilter::All, SortDirection::Ascending, Locale::En, NOW);
        for pair in out.windows(2) {
            assert!(pair[0].scoring.score <= pair[1].scoring.score);
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let markets = sample();
        let out = process_at(&markets, TierFilter::All, SortDirection::Descending, Locale::En, NOW);
        let mid_pos = out.iter().position(|sm| sm.market.id == "mid").unwrap();
        let twin_pos = out.iter().position(|sm| sm.market.id == "mid_twin").unwrap();
        assert!(mid_pos < twin_pos, "stable sort must preserve tie order");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = process_at(&[], TierFilter::All, SortDirection::Descending, Locale::En, NOW);
        assert!(out.is_empty());
    }

    #[test]
    fn locale_does_not_change_membership_or_order() {
        let markets = sample();
        let en = process_at(&markets, TierFilter::All, SortDirection::Descending, Locale::En, NOW);
        let ko = process_at(&markets, TierFilter::All, SortDirection::Descending, Locale::Ko, NOW);
        let en_ids: Vec<_> = en.iter().map(|sm| sm.market.id.clone()).collect();
        let ko_ids: Vec<_> = ko.iter().map(|sm| sm.market.id.clone()).collect();
        assert_eq!(en_ids, ko_ids);
    }
}
