use crate::normalize::{normalize_price_display, parse_showtime, ShowtimeParse};
use crate::types::{PricingRow, RawPricingLine};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Showtime(NaiveDate, NaiveTime),
    Label(String),
}

/// One row per showtime, one column per distinct section. Rows come back
/// ordered by date, then time of day; unparseable showtimes go last in the
/// order they were first seen.
pub fn build_rows(lines: &[RawPricingLine]) -> Vec<PricingRow> {
    let mut parsed: HashMap<&str, ShowtimeParse> = HashMap::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut rows: Vec<PricingRow> = Vec::new();

    for line in lines {
        let showtime = parsed
            .entry(line.showtime_label.as_str())
            .or_insert_with(|| parse_showtime(&line.showtime_label));

        let key = match showtime {
            ShowtimeParse::Parsed(st) => GroupKey::Showtime(st.date, st.time),
            ShowtimeParse::Fallback(label) => GroupKey::Label(label.clone()),
        };
        let row_idx = *index.entry(key).or_insert_with(|| {
            rows.push(match showtime {
                ShowtimeParse::Parsed(st) => PricingRow::for_showtime(st),
                ShowtimeParse::Fallback(label) => PricingRow::unparsed(label),
            });
            rows.len() - 1
        });

        let price = normalize_price_display(&line.price);
        for section in line.sections() {
            if section.is_empty() {
                continue;
            }
            rows[row_idx].insert_section(section, &price);
        }
    }

    rows.sort_by(|a, b| {
        (a.sort_date.is_none(), a.sort_date, &a.sort_time)
            .cmp(&(b.sort_date.is_none(), b.sort_date, &b.sort_time))
    });
    rows
}
