use crate::error::{Result, ScraperError};
use crate::types::{Tier, TierAssignment};
use serde_json::Value;

/// Parses the completion text into tier assignments, applying `markup` to
/// every high bound. Accepts an optional markdown code fence around the JSON.
pub fn parse_tier_response(text: &str, markup: f64) -> Result<Vec<TierAssignment>> {
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| ScraperError::ClassificationParse(format!("response is not JSON: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(ScraperError::ClassificationParse(
            "response is not a JSON object".to_string(),
        ));
    };

    let mut assignments = Vec::with_capacity(Tier::ALL.len());
    for tier in Tier::ALL {
        match map.get(tier.name()) {
            None | Some(Value::Null) => {
                if tier.is_required() {
                    return Err(ScraperError::ClassificationParse(format!(
                        "missing tier {}",
                        tier.name()
                    )));
                }
            }
            Some(range) => {
                let (low, high) = parse_range(range).ok_or_else(|| {
                    ScraperError::ClassificationParse(format!(
                        "tier {} has an unreadable range: {}",
                        tier.name(),
                        range
                    ))
                })?;
                assignments.push(TierAssignment {
                    tier,
                    low: low.round() as i64,
                    high: high.map(|h| (h * markup).round() as i64),
                });
            }
        }
    }
    Ok(assignments)
}

// [low, high], [low], [low, null], or "$low - $high".
fn parse_range(value: &Value) -> Option<(f64, Option<f64>)> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [low] => Some((parse_price(low)?, None)),
            [low, Value::Null] => Some((parse_price(low)?, None)),
            [low, high] => Some((parse_price(low)?, Some(parse_price(high)?))),
            _ => None,
        },
        Value::String(text) => {
            let mut parts = text.splitn(2, '-');
            let low = parse_price_text(parts.next()?)?;
            let high = match parts.next() {
                Some(text) => Some(parse_price_text(text)?),
                None => None,
            };
            Some((low, high))
        }
        Value::Number(_) => Some((parse_price(value)?, None)),
        _ => None,
    }
}

fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price_text(s),
        _ => None,
    }
}

fn parse_price_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}
