mod common;

use anyhow::Result;
use common::FakeHttp;
use show_pricing::app::ports::{CatalogSnapshot, SnapshotStorePort};
use show_pricing::cache::InMemorySnapshotStore;
use show_pricing::catalog::{Catalog, CatalogLoader, TourScheduleCrawler};
use show_pricing::constants::CATALOG_SNAPSHOT_ID;
use show_pricing::types::TaskSubmission;
use std::sync::Arc;
use std::time::Duration;

const BASE: &str = "https://www.broadwayinbound.com";
const LISTING: &str = "https://www.broadwayinbound.com/shows";

const LISTING_HTML: &str = r#"<html><body>
<script>
  window.dataLayer = [];
  var shows = [
    {"ShowName": "Wicked", "Url": "wicked", "ShowLetUsKnow": false,
     "FirstPerformance": "10/30/2003", "OnSaleThrough": "5/31/2027"},
    {"SortName": "Hamilton", "ShowUrlEN": "/hamilton", "ShowLetUsKnow": false},
    {"ShowName": "Coming Soon", "Url": "coming-soon", "ShowLetUsKnow": true},
    {"ShowName": "No Path", "ShowLetUsKnow": false},
    {"ShowName": "Wicked Again", "Url": "wicked", "ShowLetUsKnow": false}
  ];
</script>
</body></html>"#;

#[tokio::test]
async fn test_refresh_loads_and_resolves_submissions() -> Result<()> {
    let http = Arc::new(FakeHttp::new().with_page(LISTING, 200, LISTING_HTML));
    let loader = CatalogLoader::new(http, BASE, LISTING);
    let catalog = Catalog::new();

    let report = catalog.refresh(&loader).await;

    assert!(report.is_ok());
    let titles: Vec<_> = catalog.current().iter().map(|s| s.title.clone()).collect();
    assert_eq!(titles, vec!["Wicked", "Hamilton"]);
    assert_eq!(report.skipped_count(), 3);

    let tasks = catalog.resolve(&[
        TaskSubmission {
            show_reference: "hamilton".into(),
            from_date: "04/01/2026".into(),
            to_date: String::new(),
        },
        TaskSubmission {
            show_reference: "Coming Soon".into(),
            from_date: "04/01/2026".into(),
            to_date: String::new(),
        },
    ]);
    assert_eq!(
        tasks[0].show.as_ref().map(|s| s.detail_url.as_str()),
        Some("https://www.broadwayinbound.com/hamilton")
    );
    assert!(tasks[1].show.is_none());
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_catalog() {
    let good = CatalogLoader::new(
        Arc::new(FakeHttp::new().with_page(LISTING, 200, LISTING_HTML)),
        BASE,
        LISTING,
    );
    let down = CatalogLoader::new(
        Arc::new(FakeHttp::new().with_page(LISTING, 503, "unavailable")),
        BASE,
        LISTING,
    );
    let catalog = Catalog::new();
    catalog.refresh(&good).await;

    let report = catalog.refresh(&down).await;

    assert_eq!(report.error_code.as_deref(), Some("catalog_fetch"));
    assert!(report.shows.is_empty());
    assert_eq!(catalog.current().len(), 2);
}

#[tokio::test]
async fn test_page_without_shows_array_is_a_parse_error() {
    let loader = CatalogLoader::new(
        Arc::new(FakeHttp::new().with_page(LISTING, 200, "<html><script>var x = 1;</script></html>")),
        BASE,
        LISTING,
    );
    let report = loader.load().await;
    assert_eq!(report.error_code.as_deref(), Some("catalog_parse"));
}

const TOURS_INDEX: &str = r#"<html><head><title>Touring Broadway</title></head><body>
  <a href="/tours/">All Tours</a>
  <a href="/tours/hamilton">Hamilton</a>
  <a href="/tours/wicked">Wicked</a>
</body></html>"#;

const HAMILTON_PAGE: &str = r#"<html><body>
  <div class="tour-linkout-row">
    <div class="col col1"><div class="l1">Seattle, WA</div><div class="l2">Paramount Theatre</div></div>
    <div class="col col2"><div class="l1">Mar 3 - Mar 22, 2026</div></div>
    <div class="col col3"><div class="l2"><a href="https://tickets.example/sea">Buy</a></div></div>
  </div>
</body></html>"#;

#[tokio::test]
async fn test_tour_crawl_skips_failed_pages_and_caches_rows() -> Result<()> {
    let http = Arc::new(
        FakeHttp::new()
            .with_page("https://www.broadway.org/tours/", 200, TOURS_INDEX)
            .with_page("https://www.broadway.org/tours/hamilton", 200, HAMILTON_PAGE)
            .with_page("https://www.broadway.org/tours/wicked", 500, "oops"),
    );
    let crawler = TourScheduleCrawler::new(http.clone(), "https://www.broadway.org", "/tours/", Duration::ZERO);

    let stops = crawler.crawl().await?;

    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].show, "Hamilton");
    assert_eq!(stops[0].venue, "Paramount Theatre");
    assert_eq!(http.requests.lock().unwrap().len(), 3);

    let store = InMemorySnapshotStore::new();
    assert!(store.read(CATALOG_SNAPSHOT_ID).await.map_err(anyhow::Error::msg)?.is_none());
    let snapshot = CatalogSnapshot {
        rows: stops.iter().map(serde_json::to_value).collect::<Result<_, _>>()?,
        last_scraped: chrono::Utc::now(),
    };
    store
        .upsert(CATALOG_SNAPSHOT_ID, &snapshot)
        .await
        .map_err(anyhow::Error::msg)?;
    let cached = store.read(CATALOG_SNAPSHOT_ID).await.map_err(anyhow::Error::msg)?.unwrap();
    assert_eq!(cached.rows[0]["VENUE"], "Paramount Theatre");
    Ok(())
}

#[tokio::test]
async fn test_block_page_aborts_with_empty_result() -> Result<()> {
    let http = Arc::new(FakeHttp::new().with_page(
        "https://www.broadway.org/tours/",
        200,
        "<html><head><title>Just a moment...</title></head></html>",
    ));
    let crawler = TourScheduleCrawler::new(http.clone(), "https://www.broadway.org", "/tours/", Duration::ZERO);
    assert!(crawler.crawl().await?.is_empty());
    assert_eq!(http.requests.lock().unwrap().len(), 1);
    Ok(())
}
