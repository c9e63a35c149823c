use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// One Pendle yield-token market, normalized from the REST API.
/// Immutable for the duration of a scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    /// e.g. Ether.fi, Ethena
    pub protocol: String,
    /// e.g. eETH, USDe
    pub symbol: String,
    /// Maturity instant, Unix seconds.
    pub expiry_ts: f64,
    /// Percentage units: 12.5 means 12.5%.
    pub implied_apy: f64,
    pub underlying_apy: f64,
    /// Chronological, oldest first. The engine reads only the endpoints.
    pub historical_underlying_apy: Vec<f64>,
    pub image_url: String,
    /// Link to the Pendle trade page.
    pub market_url: String,
    /// Estimated YT leverage — display-only, never scored.
    pub leverage: f64,
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// score 80–100
    StrongBuy,
    /// score 60–79
    Buy,
    /// score 40–59
    Hold,
    /// score 0–39
    Avoid,
}

impl Tier {
    /// Score → tier. Thresholds are inclusive and partition [0, 100].
    pub fn from_score(score: u8) -> Self {
        use crate::config::tier_thresholds::*;
        if score >= STRONG_BUY_MIN {
            Tier::StrongBuy
        } else if score >= BUY_MIN {
            Tier::Buy
        } else if score >= HOLD_MIN {
            Tier::Hold
        } else {
            Tier::Avoid
        }
    }

    /// Presentation style token. Derived purely from the tier — the TUI and
    /// any web frontend map it to their own palette.
    pub fn color_tag(self) -> &'static str {
        match self {
            Tier::StrongBuy => "green",
            Tier::Buy => "blue",
            Tier::Hold => "yellow",
            Tier::Avoid => "red",
        }
    }

    pub const ALL: [Tier; 4] = [Tier::StrongBuy, Tier::Buy, Tier::Hold, Tier::Avoid];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::StrongBuy => "strong_buy",
            Tier::Buy => "buy",
            Tier::Hold => "hold",
            Tier::Avoid => "avoid",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Processing parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierFilter {
    All,
    Only(Tier),
}

impl TierFilter {
    /// Lenient parse for query params and key cycling: unknown → All.
    pub fn parse(s: &str) -> Self {
        match s {
            "strong_buy" => TierFilter::Only(Tier::StrongBuy),
            "buy" => TierFilter::Only(Tier::Buy),
            "hold" => TierFilter::Only(Tier::Hold),
            "avoid" => TierFilter::Only(Tier::Avoid),
            _ => TierFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Descending,
    Ascending,
}

impl SortDirection {
    pub fn parse(s: &str) -> Self {
        match s {
            "asc" | "ascending" | "score_asc" => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }
}

/// Display language. Affects label text only — never the numeric score,
/// tier, filtering, or ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ko,
}

impl Locale {
    pub fn parse(s: &str) -> Self {
        match s {
            "ko" | "kr" => Locale::Ko,
            _ => Locale::En,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Locale::En => Locale::Ko,
            Locale::Ko => Locale::En,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ko => write!(f, "ko"),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring output
// ---------------------------------------------------------------------------

/// Signed per-factor contributions. Together with the base of 50 they sum to
/// the pre-clamp score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub spread_factor: f64,
    pub maturity_factor: f64,
    pub trend_factor: f64,
}

/// Derived per-market result. Recomputed on every pass, never persisted,
/// always 1:1 with a Market for the duration of one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: u8,
    pub tier: Tier,
    pub breakdown: ScoreBreakdown,
    /// Localized human-readable summary of the factors.
    pub analysis: String,
    pub color_tag: String,
    /// Days until maturity at the "now" the score was computed with.
    /// Negative for expired markets.
    pub days_to_maturity: i64,
}

/// What the collection processor emits to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMarket {
    pub market: Market,
    pub scoring: ScoringResult,
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// AI (or deterministic fallback) commentary for one displayed market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub description: String,
    pub verdict: String,
}

/// Request routed to the narrative worker over its mpsc channel.
/// Keyed by market identity so late responses for markets that have since
/// been dropped can be discarded.
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    pub market_id: String,
    pub locale: Locale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_partition_full_range() {
        for s in 0..=100u8 {
            let tier = Tier::from_score(s);
            let expected = match s {
                80..=100 => Tier::StrongBuy,
                60..=79 => Tier::Buy,
                40..=59 => Tier::Hold,
                _ => Tier::Avoid,
            };
            assert_eq!(tier, expected, "score {s}");
        }
    }

    #[test]
    fn color_tag_is_fixed_per_tier() {
        assert_eq!(Tier::StrongBuy.color_tag(), "green");
        assert_eq!(Tier::Buy.color_tag(), "blue");
        assert_eq!(Tier::Hold.color_tag(), "yellow");
        assert_eq!(Tier::Avoid.color_tag(), "red");
    }

    #[test]
    fn tier_filter_parses_leniently() {
        assert_eq!(TierFilter::parse("buy"), TierFilter::Only(Tier::Buy));
        assert_eq!(TierFilter::parse("strong_buy"), TierFilter::Only(Tier::StrongBuy));
        assert_eq!(TierFilter::parse("all"), TierFilter::All);
        assert_eq!(TierFilter::parse("garbage"), TierFilter::All);
    }

    #[test]
    fn sort_and_locale_parse_leniently() {
        assert_eq!(SortDirection::parse("asc"), SortDirection::Ascending);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::parse(""), SortDirection::Descending);
        assert_eq!(Locale::parse("ko"), Locale::Ko);
        assert_eq!(Locale::parse("fr"), Locale::En);
    }
}
