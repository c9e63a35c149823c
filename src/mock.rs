//! Built-in sample markets, used when the Pendle API is unreachable or
//! USE_MOCK_DATA is set. Expiries are relative to the current clock so the
//! maturity factor behaves the same on any day.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Market;

fn days_from_now(days: f64) -> f64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    now + days * 86_400.0
}

pub fn sample_markets() -> Vec<Market> {
    vec![
        Market {
            id: "mock-eeth".to_string(),
            name: "Ether.fi eETH".to_string(),
            protocol: "Ether.fi".to_string(),
            symbol: "eETH".to_string(),
            expiry_ts: days_from_now(120.0),
            implied_apy: 12.5,
            // Spread > 3%, rising trend — the showcase strong-buy.
            underlying_apy: 18.2,
            historical_underlying_apy: vec![17.0, 17.2, 17.5, 17.8, 18.0, 18.1, 18.2],
            image_url: "https://picsum.photos/id/1/200/200".to_string(),
            market_url: "https://app.pendle.finance/trade/markets".to_string(),
            leverage: 15.2,
        },
        Market {
            id: "mock-usde".to_string(),
            name: "Ethena USDe".to_string(),
            protocol: "Ethena".to_string(),
            symbol: "USDe".to_string(),
            expiry_ts: days_from_now(45.0),
            implied_apy: 25.0,
            // Negative spread, falling trend.
            underlying_apy: 15.0,
            historical_underlying_apy: vec![20.0, 19.0, 18.5, 17.0, 16.0, 15.5, 15.0],
            image_url: "https://picsum.photos/id/2/200/200".to_string(),
            market_url: "https://app.pendle.finance/trade/markets".to_string(),
            leverage: 8.5,
        },
        Market {
            id: "mock-ezeth".to_string(),
            name: "Renzo ezETH".to_string(),
            protocol: "Renzo".to_string(),
            symbol: "ezETH".to_string(),
            expiry_ts: days_from_now(120.0),
            implied_apy: 14.0,
            // Positive spread under the 3% ideal threshold.
            underlying_apy: 16.5,
            historical_underlying_apy: vec![16.0, 16.1, 16.0, 16.2, 16.3, 16.4, 16.5],
            image_url: "https://picsum.photos/id/3/200/200".to_string(),
            market_url: "https://app.pendle.finance/trade/markets".to_string(),
            leverage: 12.1,
        },
        Market {
            id: "mock-rseth".to_string(),
            name: "Kelp DAO rsETH".to_string(),
            protocol: "Kelp DAO".to_string(),
            symbol: "rsETH".to_string(),
            // < 30 days: good spread but takes the maturity penalty.
            expiry_ts: days_from_now(15.0),
            implied_apy: 8.0,
            underlying_apy: 12.0,
            historical_underlying_apy: vec![11.0, 11.2, 11.5, 11.8, 11.9, 12.0, 12.0],
            image_url: "https://picsum.photos/id/4/200/200".to_string(),
            market_url: "https://app.pendle.finance/trade/markets".to_string(),
            leverage: 35.0,
        },
        Market {
            id: "mock-pufeth".to_string(),
            name: "Puffer pufETH".to_string(),
            protocol: "Puffer".to_string(),
            symbol: "pufETH".to_string(),
            expiry_ts: days_from_now(90.0),
            implied_apy: 10.0,
            // Volatile history recovering to its starting level.
            underlying_apy: 14.5,
            historical_underlying_apy: vec![14.5, 14.0, 13.5, 13.0, 13.5, 14.0, 14.5],
            image_url: "https://picsum.photos/id/5/200/200".to_string(),
            market_url: "https://app.pendle.finance/trade/markets".to_string(),
            leverage: 18.4,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_ids_are_unique() {
        let markets = sample_markets();
        let mut ids: Vec<_> = markets.iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), markets.len());
    }

    #[test]
    fn sample_markets_are_well_formed() {
        for m in sample_markets() {
            assert!(m.implied_apy >= 0.0);
            assert!(m.underlying_apy >= 0.0);
            assert!(m.leverage > 0.0);
            assert_eq!(m.historical_underlying_apy.len(), 7);
        }
    }
}
