//! Page capability: bring a URL into a queryable, rendered state.
//!
//! The pipeline never talks to a browser directly. It drives a
//! [`PageDriver`], which navigates to a URL and hands back the rendered HTML
//! as a [`Page`]; DOM queries then run locally with `scraper`.
//!
//! | Driver | Module | Rendering | Scrolling |
//! |--------|--------|-----------|-----------|
//! | Browserless | [`browserless`] | headless Chrome via `/content` | injected script |
//! | Plain HTTP | [`http`] | none (server HTML only) | no-op |
//!
//! A run owns exactly one driver ([`Session`]) for its whole lifetime and
//! navigates one page at a time.

pub mod browserless;
#[cfg(test)]
pub mod fixtures;
pub mod http;

use crate::error::FetchError;
use scraper::Html;
use std::time::Duration;
use tracing::{info, instrument};

pub use browserless::BrowserlessDriver;
pub use http::HttpDriver;

/// How far page loading must get before a navigation counts as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    #[default]
    DomContentLoaded,
}

impl WaitUntil {
    /// Puppeteer name for the lifecycle event.
    pub fn as_puppeteer(self) -> &'static str {
        match self {
            WaitUntil::DomContentLoaded => "domcontentloaded",
        }
    }
}

/// Repeated scroll-to-bottom to surface lazily rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub passes: usize,
    pub settle: Duration,
}

impl ScrollPlan {
    pub fn total_settle(&self) -> Duration {
        self.settle.saturating_mul(self.passes as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
    pub scroll: Option<ScrollPlan>,
}

impl NavigateOptions {
    /// Article pages: DOM readiness only, no scrolling.
    pub fn article(timeout: Duration) -> Self {
        Self {
            wait_until: WaitUntil::DomContentLoaded,
            timeout,
            scroll: None,
        }
    }

    /// Listing pages: DOM readiness plus a scroll plan when `passes > 0`.
    pub fn listing(timeout: Duration, passes: usize, settle: Duration) -> Self {
        Self {
            wait_until: WaitUntil::DomContentLoaded,
            timeout,
            scroll: (passes > 0).then_some(ScrollPlan { passes, settle }),
        }
    }
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects.
    pub url: String,
    pub html: String,
}

impl Page {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Something that can navigate to URLs and return rendered pages.
pub trait PageDriver {
    /// Navigate to `url` and return the page once `options.wait_until` is reached.
    ///
    /// Single attempt; a failure here abandons the URL.
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<Page, FetchError>;

    /// Release the session. Called once at the end of a run.
    async fn close(&mut self);
}

/// The session a run holds, picked at launch time.
#[derive(Debug)]
pub enum Session {
    Browserless(BrowserlessDriver),
    Http(HttpDriver),
}

impl Session {
    /// Open a session: rendered through Browserless when an endpoint is given,
    /// otherwise plain HTTP.
    ///
    /// A failure here is fatal to the run.
    #[instrument(level = "info", skip(token))]
    pub fn launch(browserless_url: Option<&str>, token: Option<&str>) -> Result<Self, FetchError> {
        match browserless_url {
            Some(base_url) => {
                info!("Opening Browserless session");
                Ok(Session::Browserless(BrowserlessDriver::new(base_url, token)?))
            }
            None => {
                info!("No Browserless endpoint configured; opening plain HTTP session");
                Ok(Session::Http(HttpDriver::new()?))
            }
        }
    }
}

impl PageDriver for Session {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<Page, FetchError> {
        match self {
            Session::Browserless(driver) => driver.navigate(url, options).await,
            Session::Http(driver) => driver.navigate(url, options).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Session::Browserless(driver) => driver.close().await,
            Session::Http(driver) => driver.close().await,
        }
    }
}

/// Map a transport error, keeping timeouts distinguishable.
pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_secs())
    } else {
        FetchError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_options_scroll_plan() {
        let opts = NavigateOptions::listing(Duration::from_secs(60), 2, Duration::from_millis(1500));
        let plan = opts.scroll.unwrap();
        assert_eq!(plan.passes, 2);
        assert_eq!(plan.total_settle(), Duration::from_secs(3));
        assert_eq!(opts.wait_until, WaitUntil::DomContentLoaded);

        let opts = NavigateOptions::listing(Duration::from_secs(60), 0, Duration::from_millis(1500));
        assert!(opts.scroll.is_none());
    }

    #[test]
    fn test_article_options_do_not_scroll() {
        let opts = NavigateOptions::article(Duration::from_secs(60));
        assert!(opts.scroll.is_none());
        assert_eq!(opts.wait_until.as_puppeteer(), "domcontentloaded");
    }

    #[test]
    fn test_launch_picks_driver() {
        assert!(matches!(Session::launch(None, None).unwrap(), Session::Http(_)));
        assert!(matches!(
            Session::launch(Some("http://localhost:3000/"), Some("t")).unwrap(),
            Session::Browserless(_)
        ));
    }
}
