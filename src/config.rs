use crate::error::{AppError, Result};

pub const PENDLE_API_URL: &str = "https://api-v2.pendle.finance/core/v1";
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Chain IDs scanned by default: 1 = Ethereum, 42161 = Arbitrum.
pub const DEFAULT_CHAIN_IDS: &[u64] = &[1, 42161];

/// Markets requested per chain, ordered by liquidity descending.
pub const MARKETS_PER_CHAIN: usize = 20;

/// Market refresh interval (seconds) — how often to re-fetch active markets
/// from the Pendle API.
pub const MARKET_REFRESH_INTERVAL_SECS: u64 = 300;

/// Channel capacity for narrative requests.
pub const CHANNEL_CAPACITY: usize = 256;

/// Length of the synthetic underlying-APY history series built by the fetcher.
pub const HISTORY_POINTS: usize = 7;

/// Investment score constants. All factor contributions are additive to
/// BASE_SCORE; the sum is clamped to [0, 100].
pub mod scoring {
    /// Neutral starting point before any factor is applied.
    pub const BASE_SCORE: f64 = 50.0;

    /// Linear weight on the APY spread (percentage points).
    pub const SPREAD_WEIGHT: f64 = 4.0;
    /// Cap on the positive linear spread bonus.
    pub const SPREAD_BONUS_CAP: f64 = 30.0;
    /// Floor on the negative spread penalty.
    pub const SPREAD_PENALTY_FLOOR: f64 = -40.0;
    /// Spread at or above this earns the flat ideal-spread bonus.
    /// The bonus stacks with the capped linear term — the score jump at
    /// exactly 3.0 is intentional (threshold effect), not to be smoothed.
    pub const IDEAL_SPREAD_PCT: f64 = 3.0;
    pub const IDEAL_SPREAD_BONUS: f64 = 20.0;

    /// Trend contribution from comparing history endpoints.
    pub const TREND_RISING_BONUS: f64 = 20.0;
    pub const TREND_FALLING_PENALTY: f64 = -10.0;

    /// Markets maturing sooner than this many days take the penalty.
    pub const MATURITY_RISK_DAYS: i64 = 30;
    pub const MATURITY_PENALTY: f64 = -35.0;
    pub const MATURITY_BONUS: f64 = 5.0;
}

/// Inclusive lower bounds of the score tiers. Evaluated high to low;
/// anything below HOLD_MIN is Avoid.
pub mod tier_thresholds {
    pub const STRONG_BUY_MIN: u8 = 80;
    pub const BUY_MIN: u8 = 60;
    pub const HOLD_MIN: u8 = 40;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub pendle_api_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Chain IDs to scan (PENDLE_CHAIN_IDS, comma-separated).
    pub chain_ids: Vec<u64>,
    /// Markets fetched per chain (MARKETS_PER_CHAIN).
    pub markets_per_chain: usize,
    /// Refresh cadence in seconds (REFRESH_INTERVAL_SECS).
    pub refresh_interval_secs: u64,
    /// Gemini endpoint base and model (GEMINI_API_URL / GEMINI_MODEL).
    pub gemini_api_url: String,
    pub gemini_model: String,
    /// Optional — when unset the narrative worker only serves the
    /// deterministic fallback (GEMINI_API_KEY).
    pub gemini_api_key: Option<String>,
    /// Skip the network fetch and serve built-in sample markets (USE_MOCK_DATA).
    pub use_mock_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            pendle_api_url: std::env::var("PENDLE_API_URL")
                .unwrap_or_else(|_| PENDLE_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            chain_ids: std::env::var("PENDLE_CHAIN_IDS")
                .map(|raw| {
                    raw.split(',')
                        .filter_map(|s| s.trim().parse::<u64>().ok())
                        .collect::<Vec<_>>()
                })
                .ok()
                .filter(|ids| !ids.is_empty())
                .unwrap_or_else(|| DEFAULT_CHAIN_IDS.to_vec()),
            markets_per_chain: std::env::var("MARKETS_PER_CHAIN")
                .unwrap_or_else(|_| MARKETS_PER_CHAIN.to_string())
                .parse::<usize>()
                .unwrap_or(MARKETS_PER_CHAIN),
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| MARKET_REFRESH_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(MARKET_REFRESH_INTERVAL_SECS),
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| GEMINI_API_URL.to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| GEMINI_MODEL.to_string()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            use_mock_data: std::env::var("USE_MOCK_DATA")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
