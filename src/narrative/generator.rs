//! Gemini-backed market commentary with a deterministic local fallback.
//! Every failure mode — no key, network error, malformed response — resolves
//! to the fallback at this boundary and never reaches the scoring path.

use tracing::warn;

use crate::config::Config;
use crate::scorer::engine;
use crate::types::{Locale, Market, Narrative};

/// Ask the model for a description + verdict. Infallible by construction:
/// the deterministic fallback covers every error path.
pub async fn generate(
    client: &reqwest::Client,
    cfg: &Config,
    market: &Market,
    score: u8,
    locale: Locale,
) -> Narrative {
    let Some(api_key) = cfg.gemini_api_key.as_deref() else {
        return fallback_narrative(market, score, locale);
    };

    match request_model(client, cfg, api_key, market, score, locale).await {
        Ok(narrative) => narrative,
        Err(e) => {
            warn!("Narrative generation failed for {}: {e}", market.id);
            fallback_narrative(market, score, locale)
        }
    }
}

async fn request_model(
    client: &reqwest::Client,
    cfg: &Config,
    api_key: &str,
    market: &Market,
    score: u8,
    locale: Locale,
) -> crate::error::Result<Narrative> {
    let url = format!(
        "{}/models/{}:generateContent?key={}",
        cfg.gemini_api_url, cfg.gemini_model, api_key
    );

    let body = serde_json::json!({
        "contents": [{ "parts": [{ "text": build_prompt(market, score, locale) }] }],
        "generationConfig": { "responseMimeType": "application/json" }
    });

    let resp: serde_json::Value = client.post(&url).json(&body).send().await?.json().await?;

    let text = resp
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|a| a.first())
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| crate::error::AppError::Bootstrap("empty model response".to_string()))?;

    let json: serde_json::Value = serde_json::from_str(text)?;
    let spread = market.underlying_apy - market.implied_apy;
    Ok(Narrative {
        description: json
            .get("description")
            .and_then(|d| d.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Protocol for {}", market.symbol)),
        verdict: json
            .get("verdict")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                format!("Score based on APY spread of {spread:.2}%.")
            }),
    })
}

fn build_prompt(market: &Market, score: u8, locale: Locale) -> String {
    let lang_instruction = match locale {
        Locale::Ko => "Provide the response in Korean.",
        Locale::En => "Provide the response in English.",
    };
    let days = engine::days_to_maturity(
        market.expiry_ts,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64(),
    );
    let history = market
        .historical_underlying_apy
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Act as a DeFi analyst for Pendle Finance.\n\
         Analyze the following Yield Token (YT) market opportunity:\n\n\
         Project: {protocol} ({name})\n\
         Symbol: {symbol}\n\
         Implied APY (Market Price of Yield): {implied}%\n\
         Underlying APY (Real Yield): {underlying}%\n\
         Days to Maturity: {days} days\n\
         7-Day APY Trend: {history}\n\
         Calculated Investment Score: {score}/100\n\n\
         {lang_instruction}\n\n\
         Provide a JSON response with two fields:\n\
         1. \"description\": A 1-sentence explanation of what this protocol does.\n\
         2. \"verdict\": A concise 2-sentence strategic comment on why the score is {score}. \
         Mention the spread between Underlying and Implied APY, and the maturity risk/benefit.\n\n\
         Do not include markdown formatting. Just return the raw JSON string.",
        protocol = market.protocol,
        name = market.name,
        symbol = market.symbol,
        implied = market.implied_apy,
        underlying = market.underlying_apy,
    )
}

/// Templated from market fields and score only — no network, no randomness,
/// so the same inputs always read the same.
pub fn fallback_narrative(market: &Market, score: u8, locale: Locale) -> Narrative {
    let spread = market.underlying_apy - market.implied_apy;
    match locale {
        Locale::Ko => Narrative {
            description: format!("{}은(는) {} 자산을 포함합니다.", market.protocol, market.symbol),
            verdict: format!(
                "계산된 점수는 {score}점입니다. 기초 APY와 내재 APY의 차이는 {spread:.2}%입니다."
            ),
        },
        Locale::En => Narrative {
            description: format!("{} involves {} assets.", market.protocol, market.symbol),
            verdict: format!(
                "Calculated score is {score}. The spread between Underlying and Implied APY is {spread:.2}%."
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Market {
        Market {
            id: "m1".to_string(),
            name: "Ether.fi eETH".to_string(),
            protocol: "Ether.fi".to_string(),
            symbol: "eETH".to_string(),
            expiry_ts: 1_710_000_000.0,
            implied_apy: 12.5,
            underlying_apy: 18.2,
            historical_underlying_apy: vec![17.0, 18.2],
            image_url: String::new(),
            market_url: String::new(),
            leverage: 15.2,
        }
    }

    #[test]
    fn fallback_is_deterministic() {
        let a = fallback_narrative(&market(), 87, Locale::En);
        let b = fallback_narrative(&market(), 87, Locale::En);
        assert_eq!(a.description, b.description);
        assert_eq!(a.verdict, b.verdict);
    }

    #[test]
    fn fallback_mentions_score_and_spread() {
        let n = fallback_narrative(&market(), 87, Locale::En);
        assert!(n.verdict.contains("87"));
        assert!(n.verdict.contains("5.70"));
        assert!(n.description.contains("Ether.fi"));
    }

    #[test]
    fn fallback_localizes() {
        let ko = fallback_narrative(&market(), 87, Locale::Ko);
        assert!(ko.verdict.contains("점수"));
        assert!(ko.verdict.contains("87"));
    }

    #[test]
    fn prompt_carries_market_facts() {
        let p = build_prompt(&market(), 87, Locale::En);
        assert!(p.contains("eETH"));
        assert!(p.contains("87/100"));
        assert!(p.contains("Provide the response in English."));
        let p_ko = build_prompt(&market(), 87, Locale::Ko);
        assert!(p_ko.contains("Provide the response in Korean."));
    }
}
