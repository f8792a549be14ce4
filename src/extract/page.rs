use crate::app::ports::{BrowserSession, WaitState};
use crate::config::ExtractorConfig;
use crate::constants::{
    FROM_DATE_INPUT_SELECTOR, PRICE_SPAN_SELECTOR, PRICING_GRID_SELECTOR,
    PRICING_GRID_TRIGGER_ID, PRICING_ROW_SELECTOR, ROWS_TIMEOUT_MS, SECTION_SPAN_SELECTOR,
    SETTLE_DELAY_MS, SHOWTIME_HEADER_ID_PREFIX, TO_DATE_INPUT_SELECTOR, WIDGET_TIMEOUT_MS,
};
use crate::error::{Result, ScraperError};
use crate::extract::grouping::{flatten_groups, group_nodes, GridNode};
use crate::types::RawPricingLine;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument};

// Emits the grid as a flat list of header/row nodes in document order.
const GRID_WALK_SCRIPT: &str = r#"
const opts = arguments[0];
const nodes = [];
const container = document.querySelector(opts.container);
if (!container) return nodes;
const isHeader = (el) => el.tagName === 'H3' && el.id && el.id.startsWith(opts.headerPrefix);
const headers = container.querySelectorAll("h3[id^='" + opts.headerPrefix + "']");
headers.forEach((header) => {
  nodes.push({ kind: 'header', text: header.innerText.trim() });
  let node = header.nextElementSibling;
  while (node && !isHeader(node)) {
    const sections = Array.from(node.querySelectorAll(opts.sectionSpans)).map((s) => s.innerText.trim());
    const prices = Array.from(node.querySelectorAll(opts.priceSpans)).map((s) => s.innerText.trim());
    nodes.push({ kind: 'row', sections: sections, prices: prices });
    node = node.nextElementSibling;
  }
});
return nodes;
"#;

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub widget_timeout: Duration,
    pub rows_timeout: Duration,
    /// Pause after changing the date range, before looking for rows.
    pub settle: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            widget_timeout: Duration::from_millis(WIDGET_TIMEOUT_MS),
            rows_timeout: Duration::from_millis(ROWS_TIMEOUT_MS),
            settle: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

impl From<&ExtractorConfig> for ExtractorSettings {
    fn from(cfg: &ExtractorConfig) -> Self {
        Self {
            widget_timeout: Duration::from_millis(cfg.widget_timeout_ms),
            rows_timeout: Duration::from_millis(cfg.rows_timeout_ms),
            settle: Duration::from_millis(cfg.settle_ms),
        }
    }
}

/// Drives one browser session through the pricing grid of a show page.
/// Sequential, no retries.
#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    settings: ExtractorSettings,
}

impl PageExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    #[instrument(skip(self, session), fields(url = %url))]
    pub async fn extract(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        from_date: &str,
        to_date: &str,
    ) -> Result<Vec<RawPricingLine>> {
        debug!("Navigating to show page");
        session.navigate(url).await.map_err(ScraperError::Browser)?;

        let clicked = session
            .click_by_id(PRICING_GRID_TRIGGER_ID)
            .await
            .map_err(ScraperError::Browser)?;
        if !clicked {
            return Err(ScraperError::ControlNotFound(PRICING_GRID_TRIGGER_ID.to_string()));
        }

        // The page repeats the date input ids in other calendar views, so
        // both inputs are scoped to the grid container.
        let widget = [
            (PRICING_GRID_SELECTOR, WaitState::Attached),
            (FROM_DATE_INPUT_SELECTOR, WaitState::Visible),
            (TO_DATE_INPUT_SELECTOR, WaitState::Visible),
        ];
        for (selector, state) in widget {
            let appeared = session
                .wait_for_selector(selector, state, self.settings.widget_timeout)
                .await
                .map_err(ScraperError::Browser)?;
            if !appeared {
                return Err(ScraperError::WidgetTimeout(selector.to_string()));
            }
        }

        debug!(from_date, to_date, "Setting pricing grid date range");
        session
            .force_input_value(FROM_DATE_INPUT_SELECTOR, from_date)
            .await
            .map_err(ScraperError::Browser)?;
        session
            .force_input_value(TO_DATE_INPUT_SELECTOR, to_date)
            .await
            .map_err(ScraperError::Browser)?;

        if !self.settings.settle.is_zero() {
            tokio::time::sleep(self.settings.settle).await;
        }

        let rows_visible = session
            .wait_for_selector(PRICING_ROW_SELECTOR, WaitState::Visible, self.settings.rows_timeout)
            .await
            .map_err(ScraperError::Browser)?;
        if !rows_visible {
            let grid_present = session
                .element_exists(PRICING_GRID_SELECTOR)
                .await
                .map_err(ScraperError::Browser)?;
            return Err(if grid_present {
                ScraperError::NoRowsFound
            } else {
                ScraperError::GridMissing
            });
        }

        let args = json!({
            "container": PRICING_GRID_SELECTOR,
            "headerPrefix": SHOWTIME_HEADER_ID_PREFIX,
            "sectionSpans": SECTION_SPAN_SELECTOR,
            "priceSpans": PRICE_SPAN_SELECTOR,
        });
        let value = session
            .evaluate(GRID_WALK_SCRIPT, args)
            .await
            .map_err(ScraperError::Browser)?;
        let nodes: Vec<GridNode> = serde_json::from_value(value)?;

        let groups = group_nodes(&nodes);
        let showtimes = groups.len();
        let lines = flatten_groups(groups);
        if lines.is_empty() {
            return Err(ScraperError::NoRowsFound);
        }

        info!("Extracted {} pricing lines across {} showtimes", lines.len(), showtimes);
        Ok(lines)
    }
}
