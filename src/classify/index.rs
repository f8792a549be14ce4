use crate::normalize::normalize_price_display;
use crate::types::{PricingRow, RawPricingLine};
use once_cell::sync::Lazy;
use regex::Regex;

static COLLISION_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*\S) \((\d+)\)$").expect("valid collision suffix regex"));

/// Distinct prices seen per section label, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionPriceIndex {
    entries: Vec<(String, Vec<String>)>,
}

impl SectionPriceIndex {
    /// Raw lines keep same-named sections with different prices apart
    /// without relying on column suffixes.
    pub fn from_lines(lines: &[RawPricingLine]) -> Self {
        let mut index = Self::default();
        for line in lines {
            let price = normalize_price_display(&line.price);
            for section in line.sections() {
                index.add(section, &price);
            }
        }
        index
    }

    /// Rebuilds the index from tabular rows, folding "Orchestra (2)" back
    /// into "Orchestra".
    pub fn from_rows(rows: &[PricingRow]) -> Self {
        let mut index = Self::default();
        for row in rows {
            for (column, price) in &row.sections {
                index.add(strip_collision_suffix(column), price);
            }
        }
        index
    }

    fn add(&mut self, label: &str, price: &str) {
        let label = label.trim();
        let price = price.trim();
        if label.is_empty() || price.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, prices)) => {
                if !prices.iter().any(|p| p == price) {
                    prices.push(price.to_string());
                }
            }
            None => self.entries.push((label.to_string(), vec![price.to_string()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    /// "Orchestra: $150, $175" per label, one per line.
    pub fn prompt_lines(&self) -> String {
        self.entries
            .iter()
            .map(|(label, prices)| format!("{}: {}", label, prices.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn strip_collision_suffix(column: &str) -> &str {
    COLLISION_SUFFIX_RE
        .captures(column)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(column)
}
