use crate::constants::{
    CATALOG_BASE_URL, CATALOG_LISTING_PATH, DEFAULT_CACHE_PATH, DEFAULT_COMPLETION_MODEL,
    DEFAULT_COMPLETION_URL, DEFAULT_WEBDRIVER_URL, MAX_CONCURRENT_EXTRACTIONS, ROWS_TIMEOUT_MS,
    SETTLE_DELAY_MS, TIER_HIGH_MARKUP, TOURS_BASE_URL, TOURS_LIST_PATH, TOURS_REQUEST_DELAY_MS,
    WIDGET_TIMEOUT_MS,
};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub extractor: ExtractorConfig,
    pub orchestrator: OrchestratorConfig,
    pub classifier: ClassifierConfig,
    pub tours: ToursConfig,
    pub webdriver: WebDriverConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub listing_path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: CATALOG_BASE_URL.to_string(),
            listing_path: CATALOG_LISTING_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub widget_timeout_ms: u64,
    pub rows_timeout_ms: u64,
    pub settle_ms: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            widget_timeout_ms: WIDGET_TIMEOUT_MS,
            rows_timeout_ms: ROWS_TIMEOUT_MS,
            settle_ms: SETTLE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: MAX_CONCURRENT_EXTRACTIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub markup: f64,
    /// Filled from `OPENAI_API_KEY`; never read from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            markup: TIER_HIGH_MARKUP,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToursConfig {
    pub base_url: String,
    pub list_path: String,
    pub request_delay_ms: u64,
}

impl Default for ToursConfig {
    fn default() -> Self {
        Self {
            base_url: TOURS_BASE_URL.to_string(),
            list_path: TOURS_LIST_PATH.to_string(),
            request_delay_ms: TOURS_REQUEST_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub url: String,
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CACHE_PATH.to_string(),
        }
    }
}

impl Config {
    /// Reads `path` if it exists (defaults otherwise), then applies
    /// environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!("Failed to read config file '{}': {}", path, e))
            })?;
            Self::from_toml(&content)?
        } else {
            Config::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_value("SHOW_PRICING_WEBDRIVER_URL") {
            self.webdriver.url = v;
        }
        if let Some(v) = env_value("SHOW_PRICING_COMPLETION_URL") {
            self.classifier.endpoint = v;
        }
        if let Some(v) = env_value("SHOW_PRICING_MODEL") {
            self.classifier.model = v;
        }
        if let Some(v) = env_value("SHOW_PRICING_CACHE_PATH") {
            self.cache.path = v;
        }
        self.classifier.api_key = env_value("OPENAI_API_KEY");
    }

    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.concurrency == 0 {
            return Err(ScraperError::Config("orchestrator.concurrency must be at least 1".into()));
        }
        if self.classifier.markup <= 0.0 {
            return Err(ScraperError::Config("classifier.markup must be positive".into()));
        }
        Ok(())
    }

    /// Absolute URL of the shows listing page.
    pub fn catalog_listing_url(&self) -> String {
        format!(
            "{}{}",
            self.catalog.base_url.trim_end_matches('/'),
            self.catalog.listing_path
        )
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
