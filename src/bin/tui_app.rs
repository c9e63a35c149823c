use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct MarketResponse {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub symbol: String,
    pub implied_apy: f64,
    pub underlying_apy: f64,
    pub leverage: f64,
    pub days_to_maturity: i64,
    pub score: u8,
    pub tier: String,
    pub tier_label: String,
    pub color_tag: String,
    pub spread_factor: f64,
    pub trend_factor: f64,
    pub maturity_factor: f64,
    pub analysis: String,
    pub market_url: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct NarrativeResponse {
    pub description: String,
    pub verdict: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct SummaryResponse {
    pub total_markets: usize,
    pub strong_buy: usize,
    pub buy: usize,
    pub hold: usize,
    pub avoid: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct HealthResponse {
    pub markets_tracked: usize,
    pub last_refresh_at_secs: u64,
    pub narrative_pending: u64,
}

// ---------------------------------------------------------------------------
// View parameters — explicit state cycled by key presses, sent as query
// params on every refresh. The server recomputes from scratch each time.
// ---------------------------------------------------------------------------

pub const TIER_FILTERS: [&str; 5] = ["all", "strong_buy", "buy", "hold", "avoid"];

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub markets: Vec<MarketResponse>,
    pub summary: SummaryResponse,
    pub health: HealthResponse,
    /// Index into TIER_FILTERS.
    pub tier_filter_idx: usize,
    pub sort_descending: bool,
    pub locale: String,
    /// Narrative for the currently selected market, if fetched.
    pub narrative: Option<NarrativeResponse>,
    pub narrative_for: Option<String>,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            markets: Vec::new(),
            summary: SummaryResponse::default(),
            health: HealthResponse::default(),
            tier_filter_idx: 0,
            sort_descending: true,
            locale: "en".to_string(),
            narrative: None,
            narrative_for: None,
            base_url,
        }
    }

    pub fn tier_filter(&self) -> &'static str {
        TIER_FILTERS[self.tier_filter_idx % TIER_FILTERS.len()]
    }

    pub fn cycle_tier_filter(&mut self) {
        self.tier_filter_idx = (self.tier_filter_idx + 1) % TIER_FILTERS.len();
    }

    pub fn toggle_sort(&mut self) {
        self.sort_descending = !self.sort_descending;
    }

    pub fn toggle_locale(&mut self) {
        self.locale = if self.locale == "en" { "ko".to_string() } else { "en".to_string() };
        // Cached narrative is in the old language.
        self.narrative = None;
        self.narrative_for = None;
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let sort = if self.sort_descending { "desc" } else { "asc" };
        let markets_url = format!(
            "{}/markets?tier={}&sort={}&locale={}",
            self.base_url,
            self.tier_filter(),
            sort,
            self.locale,
        );
        let summary_url = format!("{}/stats/summary", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (markets_res, summary_res, health_res) = tokio::join!(
            client.get(&markets_url).send(),
            client.get(&summary_url).send(),
            client.get(&health_url).send(),
        );

        let markets_res = match markets_res {
            Ok(r) => r,
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        match markets_res.json::<Vec<MarketResponse>>().await {
            Ok(m) => {
                self.markets = m;
                self.status = ConnectionStatus::Connected;
            }
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("parse error: {e}"));
                return;
            }
        }

        if let Ok(r) = summary_res {
            if let Ok(s) = r.json::<SummaryResponse>().await {
                self.summary = s;
            }
        }
        if let Ok(r) = health_res {
            if let Ok(h) = r.json::<HealthResponse>().await {
                self.health = h;
            }
        }
    }

    /// Fetch the narrative for the selected market. Stale-response safe: the
    /// result is tagged with the market id it was requested for, and the
    /// renderer ignores it once the selection has moved on.
    pub async fn fetch_narrative(&mut self, client: &reqwest::Client, market_id: &str) {
        let url = format!(
            "{}/markets/{}/narrative?locale={}",
            self.base_url, market_id, self.locale
        );
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                if let Ok(n) = resp.json::<NarrativeResponse>().await {
                    self.narrative = Some(n);
                    self.narrative_for = Some(market_id.to_string());
                }
            }
            _ => {}
        }
    }

    /// Narrative to render for the given selection, if it matches.
    pub fn narrative_for_market(&self, market_id: &str) -> Option<&NarrativeResponse> {
        match (&self.narrative_for, &self.narrative) {
            (Some(id), Some(n)) if id == market_id => Some(n),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_apy(v: f64) -> String {
    format!("{v:.2}%")
}

pub fn format_spread(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.2}%")
    } else {
        format!("{v:.2}%")
    }
}

pub fn format_days(days: i64) -> String {
    if days < 0 {
        "expired".to_string()
    } else {
        format!("{days}d")
    }
}

pub fn format_factor(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.1}")
    } else {
        format!("{v:.1}")
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn main() {
    // Shared module for the TUI — entry point lives in src/bin/tui.rs
}
