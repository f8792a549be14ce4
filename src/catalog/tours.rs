use crate::app::ports::HttpClientPort;
use crate::error::{Result, ScraperError};
use crate::metrics::names;
use metrics::counter;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const BLOCK_PAGE_MARKERS: [&str; 2] = ["Intermission", "Just a moment"];
const INDEX_LINKS: [&str; 3] = ["/tours", "/tours/", "/tours?l=1"];

/// One venue engagement from a touring show's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct TourStop {
    pub show: String,
    pub location: String,
    pub venue: String,
    pub dates: String,
    pub tickets: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourLink {
    pub name: String,
    pub url: String,
}

/// Crawls the touring index and then each show's schedule page, one at a
/// time with a fixed pause between requests.
pub struct TourScheduleCrawler {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
    list_url: String,
    delay: Duration,
}

impl TourScheduleCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: &str, list_path: &str, delay: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let list_url = format!("{}{}", base_url, list_path);
        Self { http, base_url, list_url, delay }
    }

    #[instrument(skip(self), fields(url = %self.list_url))]
    pub async fn crawl(&self) -> Result<Vec<TourStop>> {
        let response = self
            .http
            .get(&self.list_url)
            .await
            .map_err(ScraperError::CatalogFetch)?;
        if !response.is_success() {
            return Err(ScraperError::CatalogFetch(format!(
                "tour index responded with status {}",
                response.status
            )));
        }
        let html = response.text();
        if is_blocked(&html) {
            warn!("Tour index is behind a bot-protection page; try again later");
            return Ok(Vec::new());
        }

        let links = parse_show_links(&html, &self.base_url);
        info!("Found {} touring shows", links.len());

        let mut stops = Vec::new();
        for (i, link) in links.iter().enumerate() {
            info!("[{}/{}] Scraping {}", i + 1, links.len(), link.name);
            match self.http.get(&link.url).await {
                Ok(page) if page.is_success() => {
                    let rows = parse_schedule_rows(&page.text(), &link.name);
                    if rows.is_empty() {
                        debug!("No schedule rows found for {}", link.name);
                    }
                    stops.extend(rows);
                }
                Ok(page) => warn!("Skipping {}: status {}", link.name, page.status),
                Err(e) => warn!("Error scraping {}: {}", link.name, e),
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        counter!(names::TOUR_ROWS).increment(stops.len() as u64);
        info!("Scraped {} total tour rows", stops.len());
        Ok(stops)
    }
}

fn is_blocked(html: &str) -> bool {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").expect("valid selector");
    document
        .select(&title_selector)
        .next()
        .map(|t| {
            let title = t.text().collect::<String>();
            BLOCK_PAGE_MARKERS.iter().any(|m| title.contains(m))
        })
        .unwrap_or(false)
}

/// Unique `/tours/<slug>` links with non-empty text, in page order.
pub fn parse_show_links(html: &str, base_url: &str) -> Vec<TourLink> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").expect("valid selector");
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&link_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.starts_with("/tours/") || INDEX_LINKS.contains(&href) || href.contains('?') {
            continue;
        }
        let url = format!("{}{}", base_url, href);
        if seen.contains(&url) {
            continue;
        }
        let name = element_text(&anchor);
        if name.is_empty() {
            continue;
        }
        seen.insert(url.clone());
        links.push(TourLink { name, url });
    }

    links
}

pub fn parse_schedule_rows(html: &str, show: &str) -> Vec<TourStop> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse(".tour-linkout-row").expect("valid selector");
    let location_selector = Selector::parse(".col.col1 .l1").expect("valid selector");
    let venue_selector = Selector::parse(".col.col1 .l2").expect("valid selector");
    let dates_selector = Selector::parse(".col.col2 .l1").expect("valid selector");
    let tickets_selector = Selector::parse(".col.col3 .l2 a").expect("valid selector");

    let first_text = |row: &ElementRef, selector: &Selector| {
        row.select(selector)
            .next()
            .map(|e| element_text(&e))
            .unwrap_or_default()
    };

    document
        .select(&row_selector)
        .map(|row| TourStop {
            show: show.to_string(),
            location: first_text(&row, &location_selector),
            venue: first_text(&row, &venue_selector),
            dates: first_text(&row, &dates_selector),
            tickets: row
                .select(&tickets_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
