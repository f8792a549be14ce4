use crate::app::ports::HttpClientPort;
use crate::error::ScraperError;
use crate::metrics::names;
use crate::types::ShowListing;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// Assignment prefixes that introduce the embedded shows array, most
// specific first. Each match ends on the opening bracket.
static SHOWS_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("var shows", r"var\s+shows\s*=\s*\["),
        ("shows", r"\bshows\s*=\s*\["),
        ("showsList", r"showsList\s*=\s*\["),
        ("data.shows", r"data\.shows\s*=\s*\["),
        ("\"shows\":", r#""shows"\s*:\s*\["#),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("shows pattern is valid")))
    .collect()
});

const SLUG_KEYS: [&str; 4] = ["Url", "ShowUrlEN", "url", "slug"];
const TITLE_KEYS: [&str; 4] = ["ShowName", "SortName", "title", "name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Info,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTraceEntry {
    pub level: TraceLevel,
    pub message: String,
}

/// Whatever could be loaded, plus a record of what was skipped and why.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogLoadReport {
    pub shows: Vec<ShowListing>,
    pub trace: Vec<CatalogTraceEntry>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl CatalogLoadReport {
    fn info(&mut self, message: String) {
        debug!("{}", message);
        self.trace.push(CatalogTraceEntry { level: TraceLevel::Info, message });
    }

    fn skipped(&mut self, message: String) {
        debug!("{}", message);
        self.trace.push(CatalogTraceEntry { level: TraceLevel::Skipped, message });
    }

    fn fail(&mut self, error: ScraperError) {
        warn!("{}", error);
        self.trace.push(CatalogTraceEntry {
            level: TraceLevel::Error,
            message: error.to_string(),
        });
        self.error_code = Some(error.code().to_string());
        self.error = Some(error.to_string());
    }

    pub fn skipped_count(&self) -> usize {
        self.trace.iter().filter(|t| t.level == TraceLevel::Skipped).count()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetches the shows listing page and keeps the shows with published pricing.
pub struct CatalogLoader {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
    listing_url: String,
}

impl CatalogLoader {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: &str, listing_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            listing_url: listing_url.to_string(),
        }
    }

    /// Never fails outright; fetch and parse problems land in the report.
    #[instrument(skip(self), fields(url = %self.listing_url))]
    pub async fn load(&self) -> CatalogLoadReport {
        info!("Fetching shows listing");
        let response = match self.http.get(&self.listing_url).await {
            Ok(r) => r,
            Err(e) => {
                let mut report = CatalogLoadReport::default();
                report.fail(ScraperError::CatalogFetch(e));
                return report;
            }
        };
        if !response.is_success() {
            let mut report = CatalogLoadReport::default();
            report.fail(ScraperError::CatalogFetch(format!(
                "listing page responded with status {}",
                response.status
            )));
            return report;
        }

        let report = parse_listing_page(&response.text(), &self.base_url);
        counter!(names::CATALOG_KEPT).increment(report.shows.len() as u64);
        counter!(names::CATALOG_SKIPPED).increment(report.skipped_count() as u64);
        info!(
            "Loaded {} shows with pricing ({} skipped)",
            report.shows.len(),
            report.skipped_count()
        );
        report
    }
}

/// Finds the embedded shows array in `html` and normalizes each entry.
pub fn parse_listing_page(html: &str, base_url: &str) -> CatalogLoadReport {
    let mut report = CatalogLoadReport::default();

    let Some(entries) = find_shows_array(html, &mut report) else {
        report.fail(ScraperError::CatalogParse(
            "could not find the shows array with any pattern".to_string(),
        ));
        return report;
    };
    report.info(format!("Parsed {} shows from JSON", entries.len()));

    let base_url = base_url.trim_end_matches('/');
    let mut seen = HashSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        match normalize_entry(entry, base_url) {
            Ok(show) => {
                if !seen.insert(show.detail_url.clone()) {
                    report.skipped(format!("Skipped duplicate listing: {}", show.detail_url));
                    continue;
                }
                report.info(format!(
                    "Found show with pricing: {} -> {} (First: {}, Sale Through: {})",
                    show.title, show.detail_url, show.first_performance, show.on_sale_through
                ));
                report.shows.push(show);
            }
            Err(reason) => report.skipped(format!("Skipped entry {}: {}", idx, reason)),
        }
    }

    report
}

fn find_shows_array(html: &str, report: &mut CatalogLoadReport) -> Option<Vec<Value>> {
    for (name, pattern) in SHOWS_PATTERNS.iter() {
        for found in pattern.find_iter(html) {
            // Back up onto the '[' the pattern ended with.
            let start = found.end() - 1;
            let mut stream = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(Value::Array(entries))) => {
                    report.info(format!("Found shows array using pattern '{}'", name));
                    return Some(entries);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    report.info(format!("Pattern '{}' matched but JSON was malformed: {}", name, e));
                }
                None => {}
            }
        }
    }
    None
}

fn first_text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_entry(entry: &Value, base_url: &str) -> Result<ShowListing, String> {
    if !entry.is_object() {
        return Err("not a JSON object".to_string());
    }

    let title = first_text(entry, &TITLE_KEYS);
    // Listings without the flag have no pricing yet.
    let published = entry.get("ShowLetUsKnow").and_then(Value::as_bool) == Some(false);
    if !published {
        return Err(format!(
            "no pricing yet ({})",
            title.as_deref().unwrap_or("Unknown")
        ));
    }

    let slug = first_text(entry, &SLUG_KEYS);
    let (slug, title) = match (slug, title) {
        (Some(slug), Some(title)) => (slug, title),
        (None, None) => return Err("missing both slug and title".to_string()),
        (None, Some(title)) => return Err(format!("missing detail path ({})", title)),
        (Some(slug), None) => return Err(format!("missing title ({})", slug)),
    };

    let path = if slug.starts_with('/') {
        slug
    } else {
        format!("/{}", slug)
    };

    Ok(ShowListing {
        title,
        detail_url: format!("{}{}", base_url, path),
        first_performance: first_text(entry, &["FirstPerformance"]).unwrap_or_default(),
        on_sale_through: first_text(entry, &["OnSaleThrough"]).unwrap_or_default(),
    })
}
