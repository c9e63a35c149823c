//! Static label tables for the two supported display languages.
//! Labels feed the engine's analysis string, the deterministic narrative
//! fallback, and the TUI captions. Nothing here influences scoring.

use crate::types::{Locale, Tier};

pub struct LogicLabels {
    pub rising: &'static str,
    pub falling: &'static str,
    pub spread_ideal: &'static str,
    pub spread: &'static str,
    pub trend: &'static str,
    pub maturity: &'static str,
}

pub struct Labels {
    pub app_title: &'static str,
    pub active_opportunities: &'static str,
    pub no_markets: &'static str,
    pub leverage: &'static str,
    pub days_left: &'static str,
    pub implied: &'static str,
    pub underlying: &'static str,
    pub projected_spread: &'static str,
    pub analysis: &'static str,
    pub generating: &'static str,
    pub filter_all: &'static str,
    pub sort_high: &'static str,
    pub sort_low: &'static str,
    pub logic: LogicLabels,
}

static EN: Labels = Labels {
    app_title: "Pendle YT Analyzer",
    active_opportunities: "Active Opportunities",
    no_markets: "No markets match the selected filter.",
    leverage: "Leverage",
    days_left: "days left",
    implied: "Implied APY (Cost)",
    underlying: "Underlying APY (Earn)",
    projected_spread: "Projected Spread",
    analysis: "Analysis",
    generating: "Generating insights...",
    filter_all: "All",
    sort_high: "Highest Score First",
    sort_low: "Lowest Score First",
    logic: LogicLabels {
        rising: "Rising (Strong Signal)",
        falling: "Falling",
        spread_ideal: "(>3% Ideal)",
        spread: "Spread",
        trend: "Trend",
        maturity: "Maturity",
    },
};

static KO: Labels = Labels {
    app_title: "Pendle YT 분석기",
    active_opportunities: "활성 기회",
    no_markets: "선택한 필터와 일치하는 상품이 없습니다.",
    leverage: "레버리지",
    days_left: "일 남음",
    implied: "내재 APY (비용)",
    underlying: "기초 APY (수익)",
    projected_spread: "예상 스프레드",
    analysis: "분석",
    generating: "인사이트 생성 중...",
    filter_all: "전체",
    sort_high: "높은 점수순",
    sort_low: "낮은 점수순",
    logic: LogicLabels {
        rising: "상승세 (강력 신호)",
        falling: "하락세",
        spread_ideal: "(>3% 이상적)",
        spread: "스프레드",
        trend: "추세",
        maturity: "만기",
    },
};

pub fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::En => &EN,
        Locale::Ko => &KO,
    }
}

/// Localized tier names for display surfaces.
pub fn tier_label(tier: Tier, locale: Locale) -> &'static str {
    match (locale, tier) {
        (Locale::En, Tier::StrongBuy) => "Strong Buy",
        (Locale::En, Tier::Buy) => "Buy",
        (Locale::En, Tier::Hold) => "Hold",
        (Locale::En, Tier::Avoid) => "Avoid",
        (Locale::Ko, Tier::StrongBuy) => "강력 매수",
        (Locale::Ko, Tier::Buy) => "매수",
        (Locale::Ko, Tier::Hold) => "보유",
        (Locale::Ko, Tier::Avoid) => "관망",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_locales_have_distinct_logic_labels() {
        assert_ne!(labels(Locale::En).logic.rising, labels(Locale::Ko).logic.rising);
        assert_ne!(labels(Locale::En).logic.maturity, labels(Locale::Ko).logic.maturity);
    }

    #[test]
    fn tier_labels_cover_all_tiers() {
        for tier in Tier::ALL {
            assert!(!tier_label(tier, Locale::En).is_empty());
            assert!(!tier_label(tier, Locale::Ko).is_empty());
        }
    }
}
