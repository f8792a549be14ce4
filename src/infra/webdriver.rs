use crate::app::ports::{BrowserLauncher, BrowserSession, WaitState};
use crate::config::WebDriverConfig;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const SELECTOR_STATE_SCRIPT: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
if (arguments[1] !== 'visible') return true;
const style = window.getComputedStyle(el);
const rect = el.getBoundingClientRect();
return style.visibility !== 'hidden' && style.display !== 'none' && (rect.width > 0 || rect.height > 0);
"#;

const FORCE_VALUE_SCRIPT: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
el.removeAttribute('readonly');
el.value = arguments[1];
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

/// Starts one WebDriver session per launch against a chromedriver or
/// Selenium endpoint.
pub struct WebDriverLauncher {
    client: reqwest::Client,
    endpoint: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(config: &WebDriverConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.url.trim_end_matches('/').to_string(),
            headless: config.headless,
        }
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--window-size=1400,1000"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, String> {
        let value = send(
            &self.client,
            Method::POST,
            &format!("{}/session", self.endpoint),
            Some(self.capabilities()),
        )
        .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("WebDriver returned no session id: {}", value))?;
        debug!(session_id, "Started WebDriver session");
        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.endpoint, session_id),
            closed: false,
        }))
    }
}

pub struct WebDriverSession {
    client: reqwest::Client,
    session_url: String,
    closed: bool,
}

impl WebDriverSession {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String> {
        send(&self.client, method, &format!("{}{}", self.session_url, path), body).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, String> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn selector_in_state(&self, selector: &str, state: WaitState) -> Result<bool, String> {
        let state = match state {
            WaitState::Attached => "attached",
            WaitState::Visible => "visible",
        };
        let value = self
            .execute(SELECTOR_STATE_SCRIPT, vec![json!(selector), json!(state)])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), String> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn click_by_id(&mut self, id: &str) -> Result<bool, String> {
        let found = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": format!("[id=\"{}\"]", id) })),
            )
            .await;
        let element = match found {
            Ok(value) => value,
            Err(e) if e.starts_with("no such element") => return Ok(false),
            Err(e) => return Err(e),
        };
        let Some(element_id) = element.get(ELEMENT_KEY).and_then(Value::as_str) else {
            return Ok(false);
        };
        self.command(
            Method::POST,
            &format!("/element/{}/click", element_id),
            Some(json!({})),
        )
        .await?;
        Ok(true)
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<bool, String> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.selector_in_state(selector, state).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn element_exists(&mut self, selector: &str) -> Result<bool, String> {
        self.selector_in_state(selector, WaitState::Attached).await
    }

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, String> {
        self.execute(script, vec![args]).await
    }

    async fn force_input_value(&mut self, selector: &str, value: &str) -> Result<(), String> {
        let applied = self
            .execute(FORCE_VALUE_SCRIPT, vec![json!(selector), json!(value)])
            .await?;
        if applied.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(format!("input {} not found", selector))
        }
    }

    async fn close(&mut self) -> Result<(), String> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

/// Sends one WebDriver command and unwraps the `value` envelope. Error
/// responses come back as "<error>: <message>".
async fn send(client: &reqwest::Client, method: Method, url: &str, body: Option<Value>) -> Result<Value, String> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let payload: Value = response.json().await.map_err(|e| e.to_string())?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }
    let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");
    Err(format!("{}: {}", error, message))
}
