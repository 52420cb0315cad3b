//! Browserless page driver.
//!
//! Renders pages in a remote headless Chrome through the Browserless
//! `/content` endpoint, which returns the DOM after the requested lifecycle
//! event. Lazy loading is triggered by injecting a scroll script and holding
//! the page for the settle time before the DOM is serialized.

use super::{classify, NavigateOptions, Page, PageDriver, ScrollPlan};
use crate::error::FetchError;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};
use url::Url;

/// Headroom on top of the navigation timeout for the render API itself.
const API_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct BrowserlessDriver {
    client: reqwest::Client,
    content_url: Url,
    token: Option<String>,
}

impl BrowserlessDriver {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, FetchError> {
        let content_url = Url::parse(&format!("{}/content", base_url.trim_end_matches('/')))
            .map_err(|e| FetchError::Network(format!("invalid Browserless URL {base_url:?}: {e}")))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            content_url,
            token: token.map(String::from),
        })
    }

    fn endpoint(&self) -> Url {
        let mut endpoint = self.content_url.clone();
        if let Some(ref token) = self.token {
            endpoint.query_pairs_mut().append_pair("token", token);
        }
        endpoint
    }
}

/// Request body for `/content`.
pub(crate) fn content_request(url: &str, options: &NavigateOptions) -> Value {
    let mut body = json!({
        "url": url,
        "gotoOptions": {
            "waitUntil": options.wait_until.as_puppeteer(),
            "timeout": options.timeout.as_millis() as u64,
        },
    });
    if let Some(plan) = options.scroll {
        body["addScriptTag"] = json!([{ "content": scroll_script(&plan) }]);
        body["waitForTimeout"] = json!(plan.total_settle().as_millis() as u64);
    }
    body
}

fn scroll_script(plan: &ScrollPlan) -> String {
    format!(
        "(async () => {{ for (let i = 0; i < {passes}; i++) {{ \
         window.scrollTo(0, document.body.scrollHeight); \
         await new Promise(r => setTimeout(r, {settle})); }} }})();",
        passes = plan.passes,
        settle = plan.settle.as_millis(),
    )
}

impl PageDriver for BrowserlessDriver {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<Page, FetchError> {
        let budget = options.timeout
            + options.scroll.map(|p| p.total_settle()).unwrap_or_default()
            + API_GRACE;

        let request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&content_request(url, options))
            .timeout(budget)
            .send();

        let resp = timeout(budget, request)
            .await
            .map_err(|_| FetchError::Timeout(options.timeout.as_secs()))?
            .map_err(|e| classify(e, options.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await.map_err(|e| classify(e, options.timeout))?;
        debug!(bytes = html.len(), "Rendered page");
        Ok(Page {
            url: url.to_string(),
            html,
        })
    }

    async fn close(&mut self) {
        // Each /content call runs in its own browser context on the server.
        debug!("Browserless session closed");
    }
}
