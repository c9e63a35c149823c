//! The investment score heuristic. Pure and total: any well-formed Market
//! maps to a result without panicking, including expired markets, empty
//! history, and zero APYs.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::scoring::*;
use crate::i18n;
use crate::types::{Locale, Market, ScoreBreakdown, ScoringResult, Tier};

/// Score a market against the wall clock. Reads "now" exactly once so a
/// single call can never see two different instants.
pub fn score(market: &Market, locale: Locale) -> ScoringResult {
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    score_at(market, locale, now_secs)
}

/// Score a market at an explicit instant. Deterministic: same market and
/// same `now_secs` always produce the identical result.
pub fn score_at(market: &Market, locale: Locale, now_secs: f64) -> ScoringResult {
    let mut raw = BASE_SCORE;
    let mut breakdown = ScoreBreakdown::default();

    let days_to_maturity = days_to_maturity(market.expiry_ts, now_secs);
    let apy_diff = market.underlying_apy - market.implied_apy;

    // 1. APY spread. The flat ideal-spread bonus stacks on top of the capped
    // linear bonus, so a wide spread alone can contribute up to +50.
    if apy_diff > 0.0 {
        let spread_bonus = (apy_diff * SPREAD_WEIGHT).min(SPREAD_BONUS_CAP);
        breakdown.spread_factor += spread_bonus;
        raw += spread_bonus;

        if apy_diff >= IDEAL_SPREAD_PCT {
            breakdown.spread_factor += IDEAL_SPREAD_BONUS;
            raw += IDEAL_SPREAD_BONUS;
        }
    } else {
        let spread_penalty = (apy_diff * SPREAD_WEIGHT).max(SPREAD_PENALTY_FLOOR);
        breakdown.spread_factor += spread_penalty;
        raw += spread_penalty;
    }

    // 2. Trend, from the history endpoints only. Intermediate volatility is
    // ignored. An equal-endpoint or too-short series contributes 0 but still
    // reads as "falling" in the analysis text.
    let history = &market.historical_underlying_apy;
    let mut is_rising = false;
    if history.len() >= 2 {
        let start = history[0];
        let end = history[history.len() - 1];
        if end > start {
            breakdown.trend_factor += TREND_RISING_BONUS;
            raw += TREND_RISING_BONUS;
            is_rising = true;
        } else if end < start {
            breakdown.trend_factor += TREND_FALLING_PENALTY;
            raw += TREND_FALLING_PENALTY;
        }
    }

    // 3. Maturity. Negative days (already expired) land in the penalty branch.
    if days_to_maturity < MATURITY_RISK_DAYS {
        breakdown.maturity_factor += MATURITY_PENALTY;
        raw += MATURITY_PENALTY;
    } else {
        breakdown.maturity_factor += MATURITY_BONUS;
        raw += MATURITY_BONUS;
    }

    let score = raw.clamp(0.0, 100.0).round() as u8;
    let tier = Tier::from_score(score);

    let t = &i18n::labels(locale).logic;
    let trend_str = if is_rising { t.rising } else { t.falling };
    let spread_note = if apy_diff >= IDEAL_SPREAD_PCT { t.spread_ideal } else { "" };
    let analysis = format!(
        "{}: {:.2}% {}. {}: {}. {}: {}d.",
        t.spread, apy_diff, spread_note, t.trend, trend_str, t.maturity, days_to_maturity,
    );

    ScoringResult {
        score,
        tier,
        breakdown,
        analysis,
        color_tag: tier.color_tag().to_string(),
        days_to_maturity,
    }
}

/// Whole days until maturity, rounded up. Negative once expired.
pub fn days_to_maturity(expiry_ts: f64, now_secs: f64) -> i64 {
    ((expiry_ts - now_secs) / 86_400.0).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000.0;

    fn market(implied: f64, underlying: f64, history: Vec<f64>, days_out: f64) -> Market {
        Market {
            id: "m1".to_string(),
            name: "Test Market".to_string(),
            protocol: "TestProto".to_string(),
            symbol: "tTKN".to_string(),
            expiry_ts: NOW + days_out * 86_400.0,
            implied_apy: implied,
            underlying_apy: underlying,
            historical_underlying_apy: history,
            image_url: String::new(),
            market_url: String::new(),
            leverage: 10.0,
        }
    }

    #[test]
    fn strong_spread_rising_trend_long_maturity_is_strong_buy() {
        // diff=5.7 → min(22.8, 30) + 20 = 42.8; trend +20; maturity +5;
        // 50 + 67.8 = 117.8 → clamps to 100.
        let m = market(12.5, 18.2, vec![17.0, 17.2, 17.5, 17.8, 18.0, 18.1, 18.2], 120.0);
        let r = score_at(&m, Locale::En, NOW);
        assert_eq!(r.score, 100);
        assert_eq!(r.tier, Tier::StrongBuy);
        assert!((r.breakdown.spread_factor - 42.8).abs() < 1e-9);
        assert!((r.breakdown.trend_factor - 20.0).abs() < 1e-9);
        assert!((r.breakdown.maturity_factor - 5.0).abs() < 1e-9);
    }

    #[test]
    fn negative_spread_falling_trend_is_avoid() {
        // diff=-10 → floor at -40; trend -10; maturity +5; 50-45 = 5.
        let m = market(25.0, 15.0, vec![20.0, 19.0, 18.5, 17.0, 16.0, 15.5, 15.0], 45.0);
        let r = score_at(&m, Locale::En, NOW);
        assert_eq!(r.score, 5);
        assert_eq!(r.tier, Tier::Avoid);
        assert!((r.breakdown.spread_factor + 40.0).abs() < 1e-9);
    }

    #[test]
    fn maturity_penalty_can_be_outweighed() {
        // diff=4 → min(16,30)+20=36; trend +20; maturity -35; 50+21 = 71 → Buy.
        let m = market(8.0, 12.0, vec![11.0, 11.5, 12.0], 15.0);
        let r = score_at(&m, Locale::En, NOW);
        assert_eq!(r.score, 71);
        assert_eq!(r.tier, Tier::Buy);
    }

    #[test]
    fn score_is_always_in_bounds() {
        let extremes = [
            market(0.0, 500.0, vec![1.0, 2.0], 365.0),
            market(500.0, 0.0, vec![2.0, 1.0], -30.0),
            market(0.0, 0.0, vec![], 0.0),
        ];
        for m in &extremes {
            let r = score_at(m, Locale::En, NOW);
            assert!(r.score <= 100);
        }
    }

    #[test]
    fn spread_is_monotone_with_fixed_trend_and_maturity() {
        let mut prev = 0u8;
        for i in 0..200 {
            let diff = -12.0 + i as f64 * 0.12;
            let m = market(10.0, 10.0 + diff, vec![5.0, 6.0], 90.0);
            let s = score_at(&m, Locale::En, NOW).score;
            assert!(s >= prev, "score dropped at diff={diff}: {prev} -> {s}");
            prev = s;
        }
    }

    #[test]
    fn ideal_spread_bonus_jumps_at_threshold() {
        let below = score_at(&market(10.0, 12.99, vec![], 90.0), Locale::En, NOW);
        let at = score_at(&market(10.0, 13.0, vec![], 90.0), Locale::En, NOW);
        assert!(at.breakdown.spread_factor - below.breakdown.spread_factor > 19.0);
        assert!(at.analysis.contains("(>3% Ideal)"));
        assert!(!below.analysis.contains("(>3% Ideal)"));
    }

    #[test]
    fn same_now_is_idempotent() {
        let m = market(10.0, 14.0, vec![13.0, 13.5, 14.0], 60.0);
        let a = score_at(&m, Locale::En, NOW);
        let b = score_at(&m, Locale::En, NOW);
        assert_eq!(a.score, b.score);
        assert_eq!(a.tier, b.tier);
        assert_eq!(a.analysis, b.analysis);
    }

    #[test]
    fn flat_history_contributes_zero_but_reads_falling() {
        let m = market(10.0, 11.0, vec![11.0, 11.0, 11.0], 90.0);
        let r = score_at(&m, Locale::En, NOW);
        assert_eq!(r.breakdown.trend_factor, 0.0);
        assert!(r.analysis.contains("Falling"));
    }

    #[test]
    fn short_history_is_neutral() {
        let one = market(10.0, 11.0, vec![11.0], 90.0);
        let none = market(10.0, 11.0, vec![], 90.0);
        assert_eq!(score_at(&one, Locale::En, NOW).breakdown.trend_factor, 0.0);
        assert_eq!(score_at(&none, Locale::En, NOW).breakdown.trend_factor, 0.0);
    }

    #[test]
    fn expired_market_takes_maturity_penalty() {
        let m = market(10.0, 11.0, vec![10.0, 11.0], -5.0);
        let r = score_at(&m, Locale::En, NOW);
        assert!(r.days_to_maturity < 0);
        assert!((r.breakdown.maturity_factor + 35.0).abs() < 1e-9);
    }

    #[test]
    fn locale_changes_analysis_text_only() {
        let m = market(12.5, 18.2, vec![17.0, 18.2], 120.0);
        let en = score_at(&m, Locale::En, NOW);
        let ko = score_at(&m, Locale::Ko, NOW);
        assert_eq!(en.score, ko.score);
        assert_eq!(en.tier, ko.tier);
        assert_ne!(en.analysis, ko.analysis);
        assert!(ko.analysis.contains("스프레드"));
    }

    #[test]
    fn days_to_maturity_rounds_up() {
        assert_eq!(days_to_maturity(NOW + 1.0, NOW), 1);
        assert_eq!(days_to_maturity(NOW + 86_400.0, NOW), 1);
        assert_eq!(days_to_maturity(NOW + 86_401.0, NOW), 2);
        assert_eq!(days_to_maturity(NOW, NOW), 0);
        assert_eq!(days_to_maturity(NOW - 90_000.0, NOW), -1);
    }
}
