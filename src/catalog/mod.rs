//! Show catalog: loading the listing, holding the current snapshot, and
//! resolving caller task submissions against it.

pub mod loader;
pub mod tours;

pub use loader::{CatalogLoadReport, CatalogLoader, CatalogTraceEntry, TraceLevel};
pub use tours::{TourScheduleCrawler, TourStop};

use crate::types::{ExtractionTask, ShowListing, TaskSubmission};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::warn;

/// Read-shared list of shows. Readers get an `Arc` to an immutable list;
/// a refresh swaps in a new list and refreshes never overlap.
#[derive(Default)]
pub struct Catalog {
    current: RwLock<Arc<Vec<ShowListing>>>,
    refresh_lock: Mutex<()>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shows(shows: Vec<ShowListing>) -> Self {
        Self {
            current: RwLock::new(Arc::new(shows)),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Vec<ShowListing>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Loads a fresh listing and replaces the current one, unless the load
    /// failed and produced nothing.
    pub async fn refresh(&self, loader: &CatalogLoader) -> CatalogLoadReport {
        let _guard = self.refresh_lock.lock().await;
        let report = loader.load().await;
        if report.is_ok() || !report.shows.is_empty() {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = Arc::new(report.shows.clone());
        } else {
            warn!("Keeping previous catalog; refresh produced no shows");
        }
        report
    }

    /// Looks a show up by detail URL, then by case-insensitive title.
    pub fn find(&self, reference: &str) -> Option<ShowListing> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        let shows = self.current();
        shows
            .iter()
            .find(|s| s.detail_url == reference)
            .or_else(|| shows.iter().find(|s| s.title.eq_ignore_ascii_case(reference)))
            .cloned()
    }

    /// Turns submissions into tasks. Unknown shows are left unset so that
    /// batch validation reports them.
    pub fn resolve(&self, submissions: &[TaskSubmission]) -> Vec<ExtractionTask> {
        submissions
            .iter()
            .enumerate()
            .map(|(id, sub)| ExtractionTask {
                id,
                show: self.find(&sub.show_reference),
                from_date: sub.from_date.trim().to_string(),
                to_date: sub.to_date.trim().to_string(),
            })
            .collect()
    }
}
