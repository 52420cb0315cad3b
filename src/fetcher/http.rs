//! Plain HTTP page driver.
//!
//! Returns the server-rendered HTML without running scripts, which is enough
//! for pages whose article markup and JSON-LD ship in the initial response.

use super::{classify, NavigateOptions, Page, PageDriver};
use crate::error::FetchError;
use tokio::time::timeout;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct HttpDriver {
    client: reqwest::Client,
}

impl HttpDriver {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl PageDriver for HttpDriver {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<Page, FetchError> {
        if options.scroll.is_some() {
            debug!("Plain HTTP session cannot scroll; lazily loaded content is skipped");
        }

        let request = self.client.get(url).timeout(options.timeout).send();
        let resp = timeout(options.timeout, request)
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

        let final_url = resp.url().to_string();
        let html = resp.text().await.map_err(|e| classify(e, options.timeout))?;
        debug!(bytes = html.len(), "Fetched page");
        Ok(Page {
            url: final_url,
            html,
        })
    }

    async fn close(&mut self) {
        debug!("HTTP session closed");
    }
}
