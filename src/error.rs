use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not fetch the shows listing: {0}")]
    CatalogFetch(String),

    #[error("Could not parse the shows listing: {0}")]
    CatalogParse(String),

    #[error("Could not find the element with id '{0}'.")]
    ControlNotFound(String),

    #[error("Date picker inputs did not appear after opening pricing grid: {0}")]
    WidgetTimeout(String),

    #[error("Could not find the element with id 'pricing-grid' after setting dates.")]
    GridMissing,

    #[error("Pricing grid appeared but no product rows found for the given date range.")]
    NoRowsFound,

    #[error("Task {task}: {message}")]
    DateValidation { task: usize, message: String },

    #[error("Task {task}: Show selection is required")]
    MissingShow { task: usize },

    #[error("Tier classification failed: {0}")]
    ClassificationParse(String),

    #[error("Browser automation error: {0}")]
    Browser(String),

    #[error("Text completion error: {0}")]
    Completion(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl ScraperError {
    /// Stable short code for the extraction and validation failures,
    /// used in logs, metrics labels and exported task summaries.
    pub fn code(&self) -> &'static str {
        match self {
            ScraperError::Http(_) => "http",
            ScraperError::Json(_) => "json",
            ScraperError::Toml(_) => "toml",
            ScraperError::Io(_) => "io",
            ScraperError::Config(_) => "config",
            ScraperError::CatalogFetch(_) => "catalog_fetch",
            ScraperError::CatalogParse(_) => "catalog_parse",
            ScraperError::ControlNotFound(_) => "control_not_found",
            ScraperError::WidgetTimeout(_) => "widget_timeout",
            ScraperError::GridMissing => "grid_missing",
            ScraperError::NoRowsFound => "no_rows_found",
            ScraperError::DateValidation { .. } => "date_validation",
            ScraperError::MissingShow { .. } => "missing_show",
            ScraperError::ClassificationParse(_) => "classification_parse",
            ScraperError::Browser(_) => "browser",
            ScraperError::Completion(_) => "completion",
            ScraperError::Cache(_) => "cache",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
