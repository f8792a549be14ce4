use crate::constants::TIER_COLUMNS;
use crate::error::ScraperError;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A show whose pricing grid can be scraped. Identity is `detail_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowListing {
    pub title: String,
    #[serde(rename = "url")]
    pub detail_url: String,
    #[serde(rename = "firstPerformance", default)]
    pub first_performance: String,
    #[serde(rename = "onSaleThrough", default)]
    pub on_sale_through: String,
}

impl ShowListing {
    /// Selectable date window for this show: from the later of today and the
    /// first performance, through the last on-sale date.
    pub fn date_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let floor = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN);
        let ceiling = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or(NaiveDate::MAX);

        let first = crate::normalize::showtime::parse_listing_date(&self.first_performance)
            .unwrap_or(floor);
        let last = crate::normalize::showtime::parse_listing_date(&self.on_sale_through)
            .unwrap_or(ceiling);

        (first.max(today), last)
    }
}

/// Caller-side task description, as read from a tasks file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    /// Show title or detail URL.
    #[serde(rename = "show")]
    pub show_reference: String,
    #[serde(rename = "fromDate", default)]
    pub from_date: String,
    #[serde(rename = "toDate", default)]
    pub to_date: String,
}

/// One (show, date range) extraction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTask {
    pub id: usize,
    pub show: Option<ShowListing>,
    pub from_date: String,
    /// Empty means "same as `from_date`".
    #[serde(default)]
    pub to_date: String,
}

impl ExtractionTask {
    pub fn new(id: usize, show: ShowListing, from_date: &str, to_date: &str) -> Self {
        Self {
            id,
            show: Some(show),
            from_date: from_date.trim().to_string(),
            to_date: to_date.trim().to_string(),
        }
    }

    pub fn effective_to_date(&self) -> &str {
        if self.to_date.is_empty() {
            &self.from_date
        } else {
            &self.to_date
        }
    }

    pub fn show_title(&self) -> &str {
        self.show.as_ref().map(|s| s.title.as_str()).unwrap_or("Unknown Show")
    }

    /// "05/01/2025" or "05/01/2025 - 05/07/2025".
    pub fn date_range_label(&self) -> String {
        let to = self.effective_to_date();
        if to != self.from_date {
            format!("{} - {}", self.from_date, to)
        } else {
            self.from_date.clone()
        }
    }
}

/// A single (showtime, section, price) triple as rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPricingLine {
    #[serde(rename = "dateTime")]
    pub showtime_label: String,
    pub description: String,
    pub price: String,
}

impl RawPricingLine {
    pub fn new(showtime_label: &str, description: &str, price: &str) -> Self {
        Self {
            showtime_label: showtime_label.to_string(),
            description: description.to_string(),
            price: price.to_string(),
        }
    }

    /// Section names carried by this line. A description like
    /// "Orchestra/Front Mezz" names two sections that share one price.
    pub fn sections(&self) -> Vec<&str> {
        split_sections(&self.description)
    }
}

pub fn split_sections(description: &str) -> Vec<&str> {
    if description.contains('/') {
        description
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        vec![description.trim()]
    }
}

/// A successfully parsed showtime heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalShowtime {
    pub day_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl CanonicalShowtime {
    /// "3/8/2026"
    pub fn date_text(&self) -> String {
        self.date.format("%-m/%-d/%Y").to_string()
    }

    /// "03/08/2026"
    pub fn date_padded(&self) -> String {
        self.date.format("%m/%d/%Y").to_string()
    }

    /// "Mar 8, 2026"
    pub fn display_date(&self) -> String {
        self.date.format("%b %-d, %Y").to_string()
    }

    /// "6:30PM"
    pub fn time_label(&self) -> String {
        self.time.format("%-I:%M%p").to_string()
    }

    /// "6:30 PM"
    pub fn time_of_day(&self) -> String {
        self.time.format("%-I:%M %p").to_string()
    }

    /// "18:30"
    pub fn time_24h(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    pub fn is_matinee(&self) -> bool {
        self.time.hour() < crate::constants::MATINEE_CUTOFF_HOUR
    }

    pub fn event_time_category(&self) -> &'static str {
        if self.is_matinee() {
            "matinee"
        } else {
            "evening"
        }
    }

    /// "Sunday, 3/8/2026 6:30PM"
    pub fn label(&self) -> String {
        format!("{}, {} {}", self.day_name, self.date_text(), self.time_label())
    }
}

/// One tabular row per showtime. Section columns keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRow {
    pub event_date: String,
    pub event_time: String,
    pub time: String,
    pub sections: Vec<(String, String)>,
    /// Sort keys; `None` sorts last.
    pub sort_date: Option<NaiveDate>,
    pub sort_time: String,
}

impl PricingRow {
    pub fn for_showtime(showtime: &CanonicalShowtime) -> Self {
        Self {
            event_date: showtime.display_date(),
            event_time: showtime.event_time_category().to_string(),
            time: showtime.time_of_day(),
            sections: Vec::new(),
            sort_date: Some(showtime.date),
            sort_time: showtime.time_24h(),
        }
    }

    pub fn unparsed(label: &str) -> Self {
        Self {
            event_date: label.to_string(),
            event_time: "unknown".to_string(),
            time: String::new(),
            sections: Vec::new(),
            sort_date: None,
            sort_time: String::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, price)| price.as_str())
    }

    /// Inserts a section price, suffixing " (2)", " (3)", ... when the name
    /// is already taken by a different price. Returns the column used.
    pub fn insert_section(&mut self, name: &str, price: &str) -> String {
        let mut candidate = name.to_string();
        let mut counter = 1;
        loop {
            match self.get(&candidate) {
                None => {
                    self.sections.push((candidate.clone(), price.to_string()));
                    return candidate;
                }
                Some(existing) if existing == price => return candidate,
                Some(_) => {
                    counter += 1;
                    candidate = format!("{} ({})", name, counter);
                }
            }
        }
    }
}

impl Serialize for PricingRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.sections.len()))?;
        map.serialize_entry("eventDate", &self.event_date)?;
        map.serialize_entry("eventTime", &self.event_time)?;
        map.serialize_entry("time", &self.time)?;
        for (name, price) in &self.sections {
            map.serialize_entry(name, price)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Premium,
    MidPremium,
    Orchestra,
    FrontMezzanine,
    RearMezzanine,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Premium,
        Tier::MidPremium,
        Tier::Orchestra,
        Tier::FrontMezzanine,
        Tier::RearMezzanine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Premium => "Premium",
            Tier::MidPremium => "MidPremium",
            Tier::Orchestra => "Orchestra",
            Tier::FrontMezzanine => "FrontMezzanine",
            Tier::RearMezzanine => "RearMezzanine",
        }
    }

    pub fn column(&self) -> &'static str {
        let idx = match self {
            Tier::Premium => 0,
            Tier::MidPremium => 1,
            Tier::Orchestra => 2,
            Tier::FrontMezzanine => 3,
            Tier::RearMezzanine => 4,
        };
        TIER_COLUMNS[idx]
    }

    /// Only MidPremium may be missing from a successful classification.
    pub fn is_required(&self) -> bool {
        !matches!(self, Tier::MidPremium)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAssignment {
    pub tier: Tier,
    pub low: i64,
    pub high: Option<i64>,
}

impl TierAssignment {
    /// "$100 - $156"
    pub fn display(&self) -> String {
        match self.high {
            Some(high) => format!("${} - ${}", self.low, high),
            None => format!("${}", self.low),
        }
    }
}

/// Outcome of one extraction task. Either successful with rows or failed
/// with no rows and a message.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task: ExtractionTask,
    pub rows: Vec<RawPricingLine>,
    pub success: bool,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub completed_at: DateTime<Local>,
}

impl TaskResult {
    pub fn succeeded(task: ExtractionTask, rows: Vec<RawPricingLine>) -> Self {
        Self {
            task,
            rows,
            success: true,
            error: None,
            error_code: None,
            completed_at: Local::now(),
        }
    }

    pub fn failed(task: ExtractionTask, error: &ScraperError) -> Self {
        Self::failed_with(task, error.code(), error.to_string())
    }

    pub fn failed_with(task: ExtractionTask, code: &str, message: String) -> Self {
        Self {
            task,
            rows: Vec::new(),
            success: false,
            error: Some(message),
            error_code: Some(code.to_string()),
            completed_at: Local::now(),
        }
    }

    /// "✅ Wicked (05/01/2025 - 05/07/2025)"
    pub fn title(&self) -> String {
        let icon = if self.success { "✅" } else { "❌" };
        format!("{} {} ({})", icon, self.task.show_title(), self.task.date_range_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showtime(hour: u32, minute: u32) -> CanonicalShowtime {
        CanonicalShowtime {
            day_name: "Sunday".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_showtime_display_forms() {
        let st = showtime(18, 30);
        assert_eq!(st.date_text(), "3/8/2026");
        assert_eq!(st.date_padded(), "03/08/2026");
        assert_eq!(st.display_date(), "Mar 8, 2026");
        assert_eq!(st.time_label(), "6:30PM");
        assert_eq!(st.time_of_day(), "6:30 PM");
        assert_eq!(st.time_24h(), "18:30");
        assert_eq!(st.label(), "Sunday, 3/8/2026 6:30PM");
    }

    #[test]
    fn test_matinee_cutoff() {
        assert!(showtime(14, 0).is_matinee());
        assert!(showtime(16, 59).is_matinee());
        assert!(!showtime(17, 0).is_matinee());
        assert_eq!(showtime(19, 30).event_time_category(), "evening");
    }

    #[test]
    fn test_insert_section_collision_suffix() {
        let mut row = PricingRow::for_showtime(&showtime(19, 0));
        assert_eq!(row.insert_section("Orchestra", "$100"), "Orchestra");
        assert_eq!(row.insert_section("Orchestra", "$100"), "Orchestra");
        assert_eq!(row.insert_section("Orchestra", "$150"), "Orchestra (2)");
        assert_eq!(row.insert_section("Orchestra", "$175"), "Orchestra (3)");
        assert_eq!(row.insert_section("Orchestra", "$150"), "Orchestra (2)");
        assert_eq!(row.sections.len(), 3);
    }

    #[test]
    fn test_pricing_row_serializes_in_column_order() {
        let mut row = PricingRow::for_showtime(&showtime(18, 30));
        row.insert_section("Orchestra", "$199");
        row.insert_section("Front Mezz", "$199");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"eventDate":"Mar 8, 2026","eventTime":"evening","time":"6:30 PM","Orchestra":"$199","Front Mezz":"$199"}"#
        );
    }

    #[test]
    fn test_split_sections() {
        assert_eq!(split_sections("Orchestra/Front Mezz"), vec!["Orchestra", "Front Mezz"]);
        assert_eq!(split_sections("Balcony"), vec!["Balcony"]);
        assert_eq!(split_sections("Box / / Loge"), vec!["Box", "Loge"]);
    }

    #[test]
    fn test_effective_to_date_defaults_to_from() {
        let show = ShowListing {
            title: "Hamilton".into(),
            detail_url: "https://example.com/hamilton".into(),
            first_performance: String::new(),
            on_sale_through: String::new(),
        };
        let task = ExtractionTask::new(0, show, "05/01/2025", "");
        assert_eq!(task.effective_to_date(), "05/01/2025");
        assert_eq!(task.date_range_label(), "05/01/2025");
    }

    #[test]
    fn test_tier_assignment_display() {
        let t = TierAssignment { tier: Tier::Orchestra, low: 100, high: Some(156) };
        assert_eq!(t.display(), "$100 - $156");
        assert_eq!(Tier::Orchestra.column(), "reg_tier_3");
        assert_eq!(Tier::MidPremium.column(), "reg_tier_2");
    }

    #[test]
    fn test_date_window_clamps_to_today() {
        let show = ShowListing {
            title: "Wicked".into(),
            detail_url: "https://example.com/wicked".into(),
            first_performance: "9/17/2019".into(),
            on_sale_through: "1/3/2027".into(),
        };
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let (from, to) = show.date_window(today);
        assert_eq!(from, today);
        assert_eq!(to, NaiveDate::from_ymd_opt(2027, 1, 3).unwrap());
    }
}
