#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use show_pricing::app::ports::{
    BrowserLauncher, BrowserSession, HttpClientPort, HttpGetResult, TextCompletionPort, WaitState,
};
use show_pricing::constants::PRICING_ROW_SELECTOR;
use show_pricing::extract::ExtractorSettings;
use show_pricing::types::ShowListing;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a fake show page behaves when driven by the extractor.
#[derive(Clone, Debug)]
pub struct PageScript {
    pub has_trigger: bool,
    pub widget_ready: bool,
    pub rows_appear: bool,
    pub grid_present: bool,
    pub nodes: Value,
    pub panic_on_evaluate: bool,
}

impl PageScript {
    pub fn with_nodes(nodes: Value) -> Self {
        Self {
            has_trigger: true,
            widget_ready: true,
            rows_appear: true,
            grid_present: true,
            nodes,
            panic_on_evaluate: false,
        }
    }

    pub fn single_showtime(label: &str, section: &str, price: &str) -> Self {
        Self::with_nodes(json!([
            {"kind": "header", "text": label},
            {"kind": "row", "sections": [section], "prices": [price]}
        ]))
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    pages: HashMap<String, PageScript>,
    launched: AtomicUsize,
    closed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    peak_live: Arc<AtomicUsize>,
    evaluate_delay: Duration,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, script: PageScript) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    /// Holds every session open for `delay` while the grid is read.
    pub fn with_evaluate_delay(mut self, delay: Duration) -> Self {
        self.evaluate_delay = delay;
        self
    }

    /// Most sessions open at the same time so far.
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// A standalone session bound to `script` whatever URL is navigated to.
    pub fn session_for(script: PageScript) -> FakeSession {
        FakeSession {
            pages: HashMap::new(),
            fallback: Some(script),
            current: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            evaluate_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, String> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            fallback: None,
            current: None,
            calls: self.calls.clone(),
            closed: self.closed.clone(),
            live: self.live.clone(),
            evaluate_delay: self.evaluate_delay,
        }))
    }
}

pub struct FakeSession {
    pages: HashMap<String, PageScript>,
    fallback: Option<PageScript>,
    current: Option<PageScript>,
    pub calls: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    evaluate_delay: Duration,
}

impl FakeSession {
    fn page(&self) -> Result<&PageScript, String> {
        self.current
            .as_ref()
            .ok_or_else(|| "no page loaded".to_string())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), String> {
        self.record(format!("navigate {}", url));
        self.current = self
            .pages
            .get(url)
            .cloned()
            .or_else(|| self.fallback.clone());
        if self.current.is_none() {
            return Err(format!("net::ERR_NAME_NOT_RESOLVED at {}", url));
        }
        Ok(())
    }

    async fn click_by_id(&mut self, id: &str) -> Result<bool, String> {
        self.record(format!("click {}", id));
        Ok(self.page()?.has_trigger)
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _state: WaitState,
        _timeout: Duration,
    ) -> Result<bool, String> {
        let page = self.page()?;
        if selector == PRICING_ROW_SELECTOR {
            Ok(page.rows_appear)
        } else {
            Ok(page.widget_ready)
        }
    }

    async fn element_exists(&mut self, _selector: &str) -> Result<bool, String> {
        Ok(self.page()?.grid_present)
    }

    async fn evaluate(&mut self, _script: &str, _args: Value) -> Result<Value, String> {
        let page = self.page()?.clone();
        if page.panic_on_evaluate {
            panic!("page crashed while walking the grid");
        }
        if !self.evaluate_delay.is_zero() {
            tokio::time::sleep(self.evaluate_delay).await;
        }
        Ok(page.nodes)
    }

    async fn force_input_value(&mut self, selector: &str, value: &str) -> Result<(), String> {
        self.record(format!("fill {}={}", selector, value));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), String> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeCompletion {
    response: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextCompletionPort for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }
}

#[derive(Default)]
pub struct FakeHttp {
    pages: HashMap<String, (u16, String)>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some((status, body)) => Ok(HttpGetResult {
                status: *status,
                bytes: body.as_bytes().to_vec(),
                content_type: "text/html".to_string(),
            }),
            None => Err(format!("connection refused: {}", url)),
        }
    }
}

pub fn fast_settings() -> ExtractorSettings {
    ExtractorSettings {
        widget_timeout: Duration::from_millis(10),
        rows_timeout: Duration::from_millis(10),
        settle: Duration::ZERO,
    }
}

pub fn show(slug: &str) -> ShowListing {
    ShowListing {
        title: slug.replace('-', " "),
        detail_url: show_url(slug),
        first_performance: String::new(),
        on_sale_through: String::new(),
    }
}

pub fn show_url(slug: &str) -> String {
    format!("https://www.broadwayinbound.com/{}", slug)
}
