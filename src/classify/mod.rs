//! Maps a task's observed section prices onto the five group-sales tiers
//! with the help of a text-completion collaborator.

pub mod index;
pub mod response;

pub use index::SectionPriceIndex;
pub use response::parse_tier_response;

use crate::app::ports::TextCompletionPort;
use crate::error::{Result, ScraperError};
use crate::metrics::names;
use crate::transform::tabular::build_rows;
use crate::types::{PricingRow, RawPricingLine, Tier, TierAssignment};
use metrics::counter;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{info, warn};

const PROMPT_TEMPLATE: &str = "\
You are pricing group tickets for a Broadway show. Below are the seating sections \
listed for the show and the prices observed for each section.

{sections}

Group these prices into exactly five tiers: Premium, MidPremium, Orchestra, \
FrontMezzanine, RearMezzanine. For each tier give the lowest and highest price that \
belongs to it, taken from the prices above. If the house has no tier between \
Premium and Orchestra, set MidPremium to null.

Respond with JSON only, in exactly this shape and with no commentary:
{\"Premium\": [low, high], \"MidPremium\": [low, high], \"Orchestra\": [low, high], \
\"FrontMezzanine\": [low, high], \"RearMezzanine\": [low, high]}";

pub fn build_prompt(index: &SectionPriceIndex) -> String {
    PROMPT_TEMPLATE.replace("{sections}", &index.prompt_lines())
}

/// A tabular row re-emitted with the five `reg_tier_*` columns appended.
#[derive(Debug, Clone, PartialEq)]
pub struct TieredRow {
    pub row: PricingRow,
    /// Indexed by tier position; `None` serializes as the text "null".
    pub tiers: [Option<String>; 5],
}

impl Serialize for TieredRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let row = &self.row;
        let mut map = serializer.serialize_map(Some(3 + row.sections.len() + Tier::ALL.len()))?;
        map.serialize_entry("eventDate", &row.event_date)?;
        map.serialize_entry("eventTime", &row.event_time)?;
        map.serialize_entry("time", &row.time)?;
        for (name, price) in &row.sections {
            map.serialize_entry(name, price)?;
        }
        for (tier, value) in Tier::ALL.iter().zip(&self.tiers) {
            map.serialize_entry(tier.column(), value.as_deref().unwrap_or("null"))?;
        }
        map.end()
    }
}

impl TieredRow {
    pub fn tier(&self, tier: Tier) -> Option<&str> {
        Tier::ALL
            .iter()
            .position(|t| *t == tier)
            .and_then(|i| self.tiers[i].as_deref())
    }
}

pub fn apply_tiers(rows: &[PricingRow], assignments: &[TierAssignment]) -> Vec<TieredRow> {
    let tiers: [Option<String>; 5] = Tier::ALL.map(|tier| {
        assignments
            .iter()
            .find(|a| a.tier == tier)
            .map(TierAssignment::display)
    });
    rows.iter()
        .map(|row| TieredRow {
            row: row.clone(),
            tiers: tiers.clone(),
        })
        .collect()
}

/// Result of classifying one task. Failures carry a message and no rows.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub tiers: Vec<TierAssignment>,
    pub rows: Vec<TieredRow>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl ClassificationReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn failed(err: &ScraperError) -> Self {
        Self {
            tiers: Vec::new(),
            rows: Vec::new(),
            error: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }
}

pub struct TierClassifier {
    completion: Arc<dyn TextCompletionPort>,
    markup: f64,
}

impl TierClassifier {
    pub fn new(completion: Arc<dyn TextCompletionPort>, markup: f64) -> Self {
        Self { completion, markup }
    }

    /// One completion call, no retry.
    pub async fn classify(&self, index: &SectionPriceIndex) -> Result<Vec<TierAssignment>> {
        if index.is_empty() {
            return Err(ScraperError::ClassificationParse(
                "no section prices to classify".to_string(),
            ));
        }
        let prompt = build_prompt(index);
        let text = self
            .completion
            .complete(&prompt)
            .await
            .map_err(ScraperError::Completion)?;
        parse_tier_response(&text, self.markup)
    }

    /// Classifies a task's raw lines and re-emits its tabular rows with tier
    /// columns. Never fails; errors are reported in the result.
    pub async fn classify_lines(&self, lines: &[RawPricingLine]) -> ClassificationReport {
        let index = SectionPriceIndex::from_lines(lines);
        match self.classify(&index).await {
            Ok(tiers) => {
                counter!(names::CLASSIFICATIONS, "outcome" => "ok").increment(1);
                info!("🏷️ Classified {} sections into {} tiers", index.len(), tiers.len());
                let rows = apply_tiers(&build_rows(lines), &tiers);
                ClassificationReport {
                    tiers,
                    rows,
                    error: None,
                    error_code: None,
                }
            }
            Err(e) => {
                counter!(names::CLASSIFICATIONS, "outcome" => "error").increment(1);
                warn!("Tier classification failed: {}", e);
                ClassificationReport::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_sections() {
        let lines = vec![RawPricingLine::new("FRIDAY, 3/6/2026 8:00PM", "Orchestra", "$150.00")];
        let prompt = build_prompt(&SectionPriceIndex::from_lines(&lines));
        assert!(prompt.contains("\nOrchestra: $150\n"));
        assert!(prompt.contains("\"RearMezzanine\": [low, high]"));
        assert!(!prompt.contains("{sections}"));
    }

    #[test]
    fn test_apply_tiers_serializes_all_columns() {
        let lines = vec![RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", "Orchestra", "$150.00")];
        let rows = build_rows(&lines);
        let assignments = vec![
            TierAssignment { tier: Tier::Premium, low: 250, high: Some(312) },
            TierAssignment { tier: Tier::Orchestra, low: 100, high: Some(156) },
        ];
        let tiered = apply_tiers(&rows, &assignments);
        assert_eq!(tiered[0].tier(Tier::Orchestra), Some("$100 - $156"));
        assert_eq!(tiered[0].tier(Tier::MidPremium), None);
        let json = serde_json::to_string(&tiered[0]).unwrap();
        assert_eq!(
            json,
            r#"{"eventDate":"Mar 8, 2026","eventTime":"evening","time":"6:30 PM","Orchestra":"$150","reg_tier_1":"$250 - $312","reg_tier_2":"null","reg_tier_3":"$100 - $156","reg_tier_4":"null","reg_tier_5":"null"}"#
        );
    }
}
