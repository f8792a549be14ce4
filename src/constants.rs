/// Fixed values shared across the extraction pipeline.
/// Selectors describe the pricing grid markup on show detail pages.

// Catalog source
pub const CATALOG_BASE_URL: &str = "https://www.broadwayinbound.com";
pub const CATALOG_LISTING_PATH: &str = "/shows";

// Touring schedule source
pub const TOURS_BASE_URL: &str = "https://www.broadway.org";
pub const TOURS_LIST_PATH: &str = "/tours/";
pub const TOURS_REQUEST_DELAY_MS: u64 = 500;

// Pricing grid markup
pub const PRICING_GRID_TRIGGER_ID: &str = "pricing-grid-tab-trigger";
pub const PRICING_GRID_SELECTOR: &str = "#pricing-grid";
pub const FROM_DATE_INPUT_SELECTOR: &str = "#pricing-grid input#fromDate";
pub const TO_DATE_INPUT_SELECTOR: &str = "#pricing-grid input#toDate";
pub const PRICING_ROW_SELECTOR: &str = "#pricing-grid .product-data-column.product-section span";
pub const SECTION_SPAN_SELECTOR: &str = ".product-data-column.product-section span";
pub const PRICE_SPAN_SELECTOR: &str = ".product-data-column.price span";
pub const SHOWTIME_HEADER_ID_PREFIX: &str = "product-date-time-";

// Extraction waits
pub const WIDGET_TIMEOUT_MS: u64 = 15_000;
pub const ROWS_TIMEOUT_MS: u64 = 5_000;
pub const SETTLE_DELAY_MS: u64 = 1_500;

// Orchestration
pub const MAX_CONCURRENT_EXTRACTIONS: usize = 5;

// Showtimes starting before this local hour are matinees. No timezone handling.
pub const MATINEE_CUTOFF_HOUR: u32 = 17;

// Tier classification
pub const TIER_HIGH_MARKUP: f64 = 1.04;
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";
pub const TIER_COLUMNS: [&str; 5] = [
    "reg_tier_1",
    "reg_tier_2",
    "reg_tier_3",
    "reg_tier_4",
    "reg_tier_5",
];

// Browser automation
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

// Snapshot cache
pub const DEFAULT_CACHE_PATH: &str = "data/cache.db";
pub const CATALOG_SNAPSHOT_ID: &str = "singleton";
