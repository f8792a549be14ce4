use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

// Catalog-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

// Browser-side ports

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM, visible or not.
    Attached,
    Visible,
}

/// One browser page owned by a single extraction task.
///
/// Scripts passed to `evaluate` are function bodies; `args` is available to
/// them as `arguments[0]` and the body's `return` value comes back as JSON.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), String>;

    /// Clicks the element with the given id. `Ok(false)` if no such element.
    async fn click_by_id(&mut self, id: &str) -> Result<bool, String>;

    /// `Ok(false)` when the selector did not reach `state` within `timeout`.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<bool, String>;

    async fn element_exists(&mut self, selector: &str) -> Result<bool, String>;

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, String>;

    /// Sets an input's value even when it is read-only, then dispatches
    /// `input` and `change` events.
    async fn force_input_value(&mut self, selector: &str, value: &str) -> Result<(), String>;

    async fn close(&mut self) -> Result<(), String>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, String>;
}

// Classification-side port
#[async_trait]
pub trait TextCompletionPort: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, String>;
}

// Cache-side port

/// Stored value for the singleton catalog snapshot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogSnapshot {
    pub rows: Vec<Value>,
    pub last_scraped: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
pub trait SnapshotStorePort: Send + Sync {
    async fn upsert(&self, id: &str, snapshot: &CatalogSnapshot) -> Result<(), String>;

    /// `Ok(None)` on a cold start.
    async fn read(&self, id: &str) -> Result<Option<CatalogSnapshot>, String>;
}
