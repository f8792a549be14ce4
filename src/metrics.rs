use std::net::SocketAddr;

/// Installs the Prometheus exporter when `SHOW_PRICING_METRICS_PORT` is set.
/// Without an exporter the counters below are no-ops.
pub fn init_metrics() {
    let port: u16 = match std::env::var("SHOW_PRICING_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        Some(port) => port,
        None => return,
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

pub mod names {
    pub const TASKS_STARTED: &str = "show_pricing_tasks_started_total";
    pub const TASKS_SUCCEEDED: &str = "show_pricing_tasks_succeeded_total";
    pub const TASKS_FAILED: &str = "show_pricing_tasks_failed_total";
    pub const EXTRACTION_DURATION: &str = "show_pricing_extraction_duration_seconds";
    pub const CATALOG_KEPT: &str = "show_pricing_catalog_listings_kept_total";
    pub const CATALOG_SKIPPED: &str = "show_pricing_catalog_listings_skipped_total";
    pub const CLASSIFICATIONS: &str = "show_pricing_classifications_total";
    pub const TOUR_ROWS: &str = "show_pricing_tour_rows_total";
}
