use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use rand::Rng;
use tracing::{info, warn};

use crate::config::{Config, HISTORY_POINTS};
use crate::error::Result;
use crate::mock;
use crate::types::Market;

#[derive(Debug, Default)]
pub struct FetchStats {
    pub api_total: usize,
    pub rejected_no_id: usize,
    pub rejected_negative_apy: usize,
    pub rejected_no_expiry: usize,
    pub chain_errors: usize,
    pub qualified: usize,
}

/// Fetch active YT markets from the Pendle REST API across all configured
/// chains in parallel, ordered by liquidity descending per chain.
///
/// Per-chain failures degrade to an empty slice — one dead chain never sinks
/// the whole fetch. If nothing at all qualifies, the built-in sample markets
/// are returned instead so the dashboard always has content to rank.
pub async fn fetch_markets(cfg: &Config) -> Result<(Vec<Market>, FetchStats)> {
    let mut stats = FetchStats::default();

    if cfg.use_mock_data {
        let markets = mock::sample_markets();
        stats.api_total = markets.len();
        stats.qualified = markets.len();
        return Ok((markets, stats));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    let requests = cfg.chain_ids.iter().map(|&chain_id| {
        let client = client.clone();
        let base = cfg.pendle_api_url.clone();
        let limit = cfg.markets_per_chain;
        async move { (chain_id, fetch_chain(&client, &base, chain_id, limit).await) }
    });

    let mut markets = Vec::new();
    for (chain_id, result) in join_all(requests).await {
        let items = match result {
            Ok(items) => items,
            Err(e) => {
                warn!("Chain {chain_id} fetch failed: {e}");
                stats.chain_errors += 1;
                continue;
            }
        };
        stats.api_total += items.len();

        for item in &items {
            match parse_pendle_market(item, chain_id, now) {
                Ok(market) => markets.push(market),
                Err(rejection) => match rejection {
                    Rejection::NoId => stats.rejected_no_id += 1,
                    Rejection::NegativeApy => stats.rejected_negative_apy += 1,
                    Rejection::NoExpiry => stats.rejected_no_expiry += 1,
                },
            }
        }
    }

    if markets.is_empty() {
        warn!("No markets qualified from the API — falling back to built-in sample data");
        markets = mock::sample_markets();
    }

    stats.qualified = markets.len();
    Ok((markets, stats))
}

async fn fetch_chain(
    client: &reqwest::Client,
    base: &str,
    chain_id: u64,
    limit: usize,
) -> Result<Vec<serde_json::Value>> {
    let url = format!(
        "{base}/{chain_id}/markets?order_by=liquidity%3Adesc&skip=0&limit={limit}&is_active=true&is_expired=false"
    );
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;

    let items = resp
        .get("results")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default();
    info!("Chain {chain_id}: {} markets returned", items.len());
    Ok(items)
}

enum Rejection {
    NoId,
    NegativeApy,
    NoExpiry,
}

/// Map one Pendle market JSON object into our normalized record.
/// APYs arrive as fractions (0.125 = 12.5%) and are converted to percent.
fn parse_pendle_market(
    v: &serde_json::Value,
    chain_id: u64,
    now_secs: f64,
) -> std::result::Result<Market, Rejection> {
    let address = v
        .get("address")
        .and_then(|a| a.as_str())
        .ok_or(Rejection::NoId)?
        .to_string();

    let name = v
        .get("name")
        .and_then(|n| n.as_str())
        .unwrap_or("")
        .to_string();

    let implied_apy = v.get("impliedApy").and_then(|x| x.as_f64()).unwrap_or(0.0) * 100.0;
    let underlying_apy = v.get("underlyingApy").and_then(|x| x.as_f64()).unwrap_or(0.0) * 100.0;
    if implied_apy < 0.0 || underlying_apy < 0.0 {
        return Err(Rejection::NegativeApy);
    }

    let expiry_ts = v
        .get("expiry")
        .and_then(|e| e.as_str())
        .and_then(parse_iso_to_unix_secs)
        .ok_or(Rejection::NoExpiry)?;

    // The API carries no explicit YT leverage. Estimate it from duration:
    // roughly 1 / years-to-maturity, clamped to [1, 50].
    let leverage = estimate_leverage(expiry_ts, now_secs);

    // Real per-day history needs one extra API call per market; synthesize a
    // series biased by the spread sign instead, matching the dashboard's
    // trend-direction-only consumption.
    let historical_underlying_apy =
        synthetic_history(underlying_apy, underlying_apy - implied_apy);

    let protocol = v
        .get("protocol")
        .and_then(|p| p.as_str())
        .map(|s| s.to_string())
        .or_else(|| name.split(' ').next().map(|s| s.to_string()))
        .unwrap_or_else(|| "Unknown".to_string());

    // 'PT-eETH' → 'eETH'
    let symbol = v
        .get("pt")
        .and_then(|pt| pt.get("symbol"))
        .and_then(|s| s.as_str())
        .map(|s| s.strip_prefix("PT-").unwrap_or(s).to_string())
        .or_else(|| {
            v.get("accountingAsset")
                .and_then(|a| a.get("symbol"))
                .and_then(|s| s.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| name.clone());

    let image_url = ["inputToken", "underlyingAsset", "accountingAsset"]
        .iter()
        .find_map(|field| {
            v.get(field)
                .and_then(|t| t.get("logos"))
                .and_then(|l| l.as_array())
                .and_then(|a| a.first())
                .and_then(|s| s.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_default();

    let market_url = format!(
        "https://app.pendle.finance/trade/markets/{address}/swap?view=yt&chain={chain_id}"
    );

    Ok(Market {
        id: address,
        name,
        protocol,
        symbol,
        expiry_ts,
        implied_apy,
        underlying_apy,
        historical_underlying_apy,
        image_url,
        market_url,
        leverage,
    })
}

/// YT leverage estimate: 1 / years-to-maturity, clamped to [1, 50] and
/// rounded to one decimal. Expired markets floor at the minimum.
pub fn estimate_leverage(expiry_ts: f64, now_secs: f64) -> f64 {
    let days = ((expiry_ts - now_secs) / 86_400.0).max(1.0);
    let leverage = (365.0 / days).clamp(1.0, 50.0);
    (leverage * 10.0).round() / 10.0
}

/// Synthetic chronological APY series around `underlying_apy`: a gentle
/// up-slope for positive spreads, down-slope otherwise, plus small noise.
/// Only the first/last relation matters downstream.
fn synthetic_history(underlying_apy: f64, spread: f64) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    let trend_bias = if spread > 0.0 { 0.1 } else { -0.1 };
    (0..HISTORY_POINTS)
        .map(|i| {
            let noise: f64 = rng.gen_range(-0.05..0.05);
            let offset = (i as f64 - (HISTORY_POINTS - 1) as f64) * -trend_bias;
            underlying_apy + noise - offset
        })
        .collect()
}

/// Parse an RFC 3339 / ISO 8601 UTC timestamp string to Unix seconds.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    let s = if let Some(dot) = s.find('.') { &s[..dot] } else { s };
    let s = if s.len() > 19 {
        let b = s.as_bytes()[19];
        if b == b'+' || b == b'-' { &s[..19] } else { s }
    } else {
        s
    };
    let (year, month, day, hour, minute, second): (i64, i64, i64, i64, i64, i64) =
        if s.len() == 10 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?, 0, 0, 0)
        } else if s.len() >= 19 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?,
             s[11..13].parse().ok()?, s[14..16].parse().ok()?, s[17..19].parse().ok()?)
        } else {
            return None;
        };

    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    let unix_days = jdn - 2_440_588;
    Some((unix_days * 86400 + hour * 3600 + minute * 60 + second) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: f64 = 1_700_000_000.0;

    fn pendle_item() -> serde_json::Value {
        json!({
            "address": "0xabc123",
            "name": "eETH Market",
            "protocol": "Ether.fi",
            "expiry": "2026-12-26T00:00:00.000Z",
            "impliedApy": 0.125,
            "underlyingApy": 0.182,
            "pt": { "symbol": "PT-eETH" },
            "inputToken": { "logos": ["https://example.com/eeth.png"] }
        })
    }

    #[test]
    fn parses_pendle_market_fields() {
        let m = parse_pendle_market(&pendle_item(), 1, NOW).ok().unwrap();
        assert_eq!(m.id, "0xabc123");
        assert_eq!(m.protocol, "Ether.fi");
        assert_eq!(m.symbol, "eETH");
        assert!((m.implied_apy - 12.5).abs() < 1e-9);
        assert!((m.underlying_apy - 18.2).abs() < 1e-9);
        assert_eq!(m.historical_underlying_apy.len(), HISTORY_POINTS);
        assert!(m.market_url.contains("0xabc123"));
        assert!(m.market_url.contains("chain=1"));
    }

    #[test]
    fn missing_address_is_rejected() {
        let mut item = pendle_item();
        item.as_object_mut().unwrap().remove("address");
        assert!(parse_pendle_market(&item, 1, NOW).is_err());
    }

    #[test]
    fn missing_expiry_is_rejected() {
        let mut item = pendle_item();
        item.as_object_mut().unwrap().remove("expiry");
        assert!(parse_pendle_market(&item, 1, NOW).is_err());
    }

    #[test]
    fn iso_parse_handles_common_shapes() {
        // 2023-11-14T22:13:20Z == 1700000000
        assert_eq!(parse_iso_to_unix_secs("2023-11-14T22:13:20Z"), Some(1_700_000_000.0));
        assert_eq!(parse_iso_to_unix_secs("2023-11-14T22:13:20.123Z"), Some(1_700_000_000.0));
        assert_eq!(parse_iso_to_unix_secs("2023-11-14"), Some(1_699_920_000.0));
        assert_eq!(parse_iso_to_unix_secs("not a date"), None);
    }

    #[test]
    fn leverage_is_clamped_and_duration_driven() {
        // ~1 year out → ~1x
        assert!((estimate_leverage(NOW + 365.0 * 86_400.0, NOW) - 1.0).abs() < 0.1);
        // ~36.5 days out → ~10x
        assert!((estimate_leverage(NOW + 36.5 * 86_400.0, NOW) - 10.0).abs() < 0.3);
        // very short maturity clamps at 50x
        assert_eq!(estimate_leverage(NOW + 3_600.0, NOW), 50.0);
        // expired never panics, floors at 1 day → clamped
        assert_eq!(estimate_leverage(NOW - 86_400.0, NOW), 50.0);
    }

    #[test]
    fn synthetic_history_follows_spread_sign() {
        let up = synthetic_history(15.0, 2.0);
        let down = synthetic_history(15.0, -2.0);
        assert_eq!(up.len(), HISTORY_POINTS);
        // Bias is ±0.1/step over 6 steps with ±0.05 noise, so the endpoint
        // relation is deterministic even with noise.
        assert!(up[HISTORY_POINTS - 1] > up[0]);
        assert!(down[HISTORY_POINTS - 1] < down[0]);
    }
}
