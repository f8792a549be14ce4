use crate::normalize::{categorize, extract_numeric_price, normalize_price_display, parse_showtime, ShowtimeParse};
use crate::types::RawPricingLine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

static LABEL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").expect("label date pattern is valid"));

/// Copy-ready pricing text for one showtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayBlock {
    /// The showtime heading exactly as scraped.
    pub showtime_label: String,
    pub header: String,
    pub lines: Vec<String>,
}

impl DisplayBlock {
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.lines.len() * 24);
        out.push_str(&self.header);
        out.push('\n');
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }
}

struct RankedLine {
    text: String,
    price: f64,
    rank: u8,
}

/// One block per distinct showtime label, in first-appearance order.
pub fn format_pricing_by_date(lines: &[RawPricingLine], show_title: Option<&str>) -> Vec<DisplayBlock> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&RawPricingLine>> = HashMap::new();
    for line in lines {
        let label = line.showtime_label.as_str();
        grouped
            .entry(label)
            .or_insert_with(|| {
                order.push(label);
                Vec::new()
            })
            .push(line);
    }

    order
        .into_iter()
        .map(|label| DisplayBlock {
            showtime_label: label.to_string(),
            header: header_for(label, show_title),
            lines: display_lines(grouped.get(label).map(Vec::as_slice).unwrap_or_default()),
        })
        .collect()
}

/// "Below is group pricing for Wicked on Sunday, 3/8/2026 at 6:30PM, subject
/// to change and availability." The date keeps the label's own padding.
pub fn header_for(label: &str, show_title: Option<&str>) -> String {
    let when = match parse_showtime(label) {
        ShowtimeParse::Parsed(st) => {
            let date = LABEL_DATE_RE
                .find(label)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| st.date_text());
            format!("{}, {} at {}", st.day_name, date, st.time_label())
        }
        ShowtimeParse::Fallback(text) => text,
    };
    match show_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!(
            "Below is group pricing for {} on {}, subject to change and availability.",
            title, when
        ),
        None => format!(
            "Below is group pricing for {}, subject to change and availability.",
            when
        ),
    }
}

/// "Section - $price" lines with exact duplicates removed (first kept),
/// ordered by category rank, then price high to low, then text.
pub fn display_lines(lines: &[&RawPricingLine]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedLine> = Vec::new();

    for line in lines {
        let display_price = normalize_price_display(&line.price);
        for section in line.sections() {
            if section.is_empty() && line.description.contains('/') {
                continue;
            }
            let text = format!("{} - {}", section, display_price);
            if !seen.insert(text.clone()) {
                continue;
            }
            let (category, rank) = categorize(section);
            debug!(line = %text, category = category.name(), "Ranked display line");
            ranked.push(RankedLine {
                price: extract_numeric_price(&display_price),
                rank,
                text,
            });
        }
    }

    ranked.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| b.price.total_cmp(&a.price))
            .then_with(|| a.text.cmp(&b.text))
    });
    ranked.into_iter().map(|l| l.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(description: &str, price: &str) -> RawPricingLine {
        RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", description, price)
    }

    #[test]
    fn test_category_rank_beats_price() {
        let raw = vec![
            line("Mezzanine", "$300.00"),
            line("Orchestra", "$200.00"),
            line("Premium", "$150.00"),
        ];
        let refs: Vec<_> = raw.iter().collect();
        assert_eq!(
            display_lines(&refs),
            vec!["Premium - $150", "Orchestra - $200", "Mezzanine - $300"]
        );
    }

    #[test]
    fn test_price_descending_within_category() {
        let raw = vec![
            line("Rear Orchestra", "$99.00"),
            line("Center Orchestra", "$249.00"),
            line("Box", "$500.00"),
            line("Side Orchestra", "$149.50"),
        ];
        let refs: Vec<_> = raw.iter().collect();
        assert_eq!(
            display_lines(&refs),
            vec![
                "Center Orchestra - $249",
                "Side Orchestra - $149.50",
                "Rear Orchestra - $99",
                "Box - $500",
            ]
        );
    }

    #[test]
    fn test_exact_duplicates_emitted_once() {
        let raw = vec![
            line("Orchestra", "$199.00"),
            line("Orchestra", "$199"),
            line("Orchestra", "$219.00"),
        ];
        let refs: Vec<_> = raw.iter().collect();
        assert_eq!(display_lines(&refs), vec!["Orchestra - $219", "Orchestra - $199"]);
    }

    #[test]
    fn test_slash_description_becomes_two_lines() {
        let raw = vec![line("Orchestra/Front Mezz", "$199.00")];
        let blocks = format_pricing_by_date(&raw, None);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["Orchestra - $199", "Front Mezz - $199"]);
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            header_for("SUNDAY, 3/8/2026 6:30 pm", Some("Wicked")),
            "Below is group pricing for Wicked on Sunday, 3/8/2026 at 6:30PM, subject to change and availability."
        );
        assert_eq!(
            header_for("SUNDAY, 3/8/2026 6:30PM", None),
            "Below is group pricing for Sunday, 3/8/2026 at 6:30PM, subject to change and availability."
        );
        assert_eq!(
            header_for("SUNDAY, 03/08/2026 6:30 PM", Some("Wicked")),
            "Below is group pricing for Wicked on Sunday, 03/08/2026 at 6:30PM, subject to change and availability."
        );
        assert_eq!(
            header_for("MONDAY evening", Some("Wicked")),
            "Below is group pricing for Wicked on Monday evening, subject to change and availability."
        );
    }

    #[test]
    fn test_blocks_keep_first_appearance_order_and_render() {
        let raw = vec![
            RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", "Orchestra", "$199.00"),
            RawPricingLine::new("SATURDAY, 3/7/2026 2:00PM", "Balcony", "$79.00"),
            RawPricingLine::new("SUNDAY, 3/8/2026 6:30PM", "Premium", "$299.00"),
        ];
        let blocks = format_pricing_by_date(&raw, Some("Wicked"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].showtime_label, "SUNDAY, 3/8/2026 6:30PM");
        assert_eq!(
            blocks[0].render(),
            "Below is group pricing for Wicked on Sunday, 3/8/2026 at 6:30PM, subject to change and availability.\n\nPremium - $299\nOrchestra - $199"
        );
        assert_eq!(blocks[1].lines, vec!["Balcony - $79"]);
    }
}
