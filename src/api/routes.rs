use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::error::AppError;
use crate::i18n;
use crate::narrative::{generator, worker};
use crate::scorer::processor;
use crate::state::MarketStore;
use crate::types::{
    Locale, Narrative, NarrativeRequest, ScoreBreakdown, ScoredMarket, SortDirection, Tier,
    TierFilter,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<MarketStore>,
    pub narrative_tx: mpsc::Sender<NarrativeRequest>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/markets", get(get_markets))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/narrative", get(get_market_narrative))
        .route("/stats/summary", get(get_stats_summary))
        .route("/stats/latency", get(get_stats_latency))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct MarketsQuery {
    /// strong_buy | buy | hold | avoid; anything else means All.
    pub tier: Option<String>,
    /// desc (default) | asc
    pub sort: Option<String>,
    /// en (default) | ko
    pub locale: Option<String>,
}

impl MarketsQuery {
    fn view(&self) -> (TierFilter, SortDirection, Locale) {
        (
            self.tier.as_deref().map_or(TierFilter::All, TierFilter::parse),
            self.sort
                .as_deref()
                .map_or(SortDirection::Descending, SortDirection::parse),
            self.locale.as_deref().map_or(Locale::En, Locale::parse),
        )
    }
}

#[derive(Deserialize, Default)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

impl LocaleQuery {
    fn locale(&self) -> Locale {
        self.locale.as_deref().map_or(Locale::En, Locale::parse)
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
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
    pub tier: Tier,
    pub tier_label: String,
    pub color_tag: String,
    pub spread_factor: f64,
    pub trend_factor: f64,
    pub maturity_factor: f64,
    pub analysis: String,
    pub market_url: String,
    pub image_url: String,
}

impl MarketResponse {
    fn from_scored(sm: ScoredMarket, locale: Locale) -> Self {
        let ScoredMarket { market, scoring } = sm;
        let ScoreBreakdown { spread_factor, maturity_factor, trend_factor } = scoring.breakdown;
        Self {
            id: market.id,
            name: market.name,
            protocol: market.protocol,
            symbol: market.symbol,
            implied_apy: market.implied_apy,
            underlying_apy: market.underlying_apy,
            leverage: market.leverage,
            days_to_maturity: scoring.days_to_maturity,
            score: scoring.score,
            tier: scoring.tier,
            tier_label: i18n::tier_label(scoring.tier, locale).to_string(),
            color_tag: scoring.color_tag,
            spread_factor,
            trend_factor,
            maturity_factor,
            analysis: scoring.analysis,
            market_url: market.market_url,
            image_url: market.image_url,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct MarketDetailResponse {
    #[serde(flatten)]
    pub market: MarketResponse,
    pub narrative: Narrative,
    /// False while the AI text is still pending and the deterministic
    /// fallback is being served.
    pub narrative_ready: bool,
}

#[derive(Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total_markets: usize,
    pub strong_buy: usize,
    pub buy: usize,
    pub hold: usize,
    pub avoid: usize,
    pub top_markets: Vec<MarketResponse>,
}

#[derive(Serialize, Deserialize, Default)]
pub struct HealthResponse {
    pub markets_tracked: usize,
    pub last_refresh_at_secs: u64,
    pub last_refresh_added: u64,
    pub last_refresh_removed: u64,
    pub narrative_pending: u64,
}

#[derive(Serialize, Deserialize, Default)]
pub struct LatencyResponse {
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// The scored, filtered, sorted list. Recomputed from the store snapshot on
/// every request — the core holds no view state.
async fn get_markets(
    State(state): State<ApiState>,
    Query(params): Query<MarketsQuery>,
) -> Json<Vec<MarketResponse>> {
    let (tier_filter, sort, locale) = params.view();
    let snapshot = state.store.snapshot();
    let scored = processor::process(&snapshot, tier_filter, sort, locale);
    Json(
        scored
            .into_iter()
            .map(|sm| MarketResponse::from_scored(sm, locale))
            .collect(),
    )
}

async fn get_market(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> Result<Json<MarketDetailResponse>, AppError> {
    let locale = params.locale();
    let market = state
        .store
        .get_market(&market_id)
        .ok_or_else(|| AppError::UnknownMarket(market_id.clone()))?;

    let scored = processor::process(
        std::slice::from_ref(&market),
        TierFilter::All,
        SortDirection::Descending,
        locale,
    );
    let sm = scored
        .into_iter()
        .next()
        .ok_or_else(|| AppError::UnknownMarket(market_id.clone()))?;
    let score = sm.scoring.score;

    let (narrative, narrative_ready) = match state.store.get_narrative(&market_id, locale) {
        Some(n) => (n, true),
        None => {
            worker::try_request(&state.narrative_tx, &state.health, &market_id, locale);
            (generator::fallback_narrative(&market, score, locale), false)
        }
    };

    Ok(Json(MarketDetailResponse {
        market: MarketResponse::from_scored(sm, locale),
        narrative,
        narrative_ready,
    }))
}

async fn get_market_narrative(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
    Query(params): Query<LocaleQuery>,
) -> Result<Json<Narrative>, AppError> {
    let locale = params.locale();
    let market = state
        .store
        .get_market(&market_id)
        .ok_or_else(|| AppError::UnknownMarket(market_id.clone()))?;

    if let Some(n) = state.store.get_narrative(&market_id, locale) {
        return Ok(Json(n));
    }

    worker::try_request(&state.narrative_tx, &state.health, &market_id, locale);
    let score = crate::scorer::engine::score(&market, locale).score;
    Ok(Json(generator::fallback_narrative(&market, score, locale)))
}

async fn get_stats_summary(State(state): State<ApiState>) -> Json<SummaryResponse> {
    let snapshot = state.store.snapshot();
    let scored = processor::process(
        &snapshot,
        TierFilter::All,
        SortDirection::Descending,
        Locale::En,
    );

    let count_tier =
        |tier: Tier| scored.iter().filter(|sm| sm.scoring.tier == tier).count();

    Json(SummaryResponse {
        total_markets: scored.len(),
        strong_buy: count_tier(Tier::StrongBuy),
        buy: count_tier(Tier::Buy),
        hold: count_tier(Tier::Hold),
        avoid: count_tier(Tier::Avoid),
        top_markets: scored
            .into_iter()
            .take(10)
            .map(|sm| MarketResponse::from_scored(sm, Locale::En))
            .collect(),
    })
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        markets_tracked: state.store.market_count(),
        last_refresh_at_secs: state.health.last_refresh_at_secs(),
        last_refresh_added: state.health.last_refresh_added(),
        last_refresh_removed: state.health.last_refresh_removed(),
        narrative_pending: state.health.narrative_pending(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_ms, p95_ms, p99_ms) = state.latency.percentiles();
    Json(LatencyResponse {
        p50_ms,
        p95_ms,
        p99_ms,
        sample_count: state.latency.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markets_query_defaults_are_lenient() {
        let q = MarketsQuery::default();
        let (filter, sort, locale) = q.view();
        assert_eq!(filter, TierFilter::All);
        assert_eq!(sort, SortDirection::Descending);
        assert_eq!(locale, Locale::En);

        let q = MarketsQuery {
            tier: Some("hold".to_string()),
            sort: Some("asc".to_string()),
            locale: Some("ko".to_string()),
        };
        let (filter, sort, locale) = q.view();
        assert_eq!(filter, TierFilter::Only(Tier::Hold));
        assert_eq!(sort, SortDirection::Ascending);
        assert_eq!(locale, Locale::Ko);
    }
}
