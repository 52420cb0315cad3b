//! Run configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file (or an empty one) describes a
//! run against the Yahoo TW entertainment section with the standard daily
//! admission policy.
//!
//! ```yaml
//! site:
//!   link_regions: ["#Col1-1-Hero-Proxy a", "#YDC-Stream a", "#Col2-1-Proxy a"]
//! admission:
//!   cutoff: "15:30"
//!   quota: 12
//!   denylist: ["AV", "(?i)drunk driving"]
//! fetch:
//!   request_delay_ms: 2000
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub admission: AdmissionConfig,
    pub fetch: FetchConfig,
}

/// Where to look and what the source site's markup looks like.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical origin prefixed onto relative hrefs.
    pub origin: String,
    /// Host an article link must live on.
    pub news_host: String,
    pub listing_url: String,
    /// Path suffix marking an article detail page.
    pub article_suffix: String,
    /// Anchor selectors for each listing-page region, queried in order.
    pub link_regions: Vec<String>,
    pub article_container: String,
    pub json_ld: String,
    pub primary_image: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://tw.news.yahoo.com".to_string(),
            news_host: "tw.news.yahoo.com".to_string(),
            listing_url: "https://tw.news.yahoo.com/entertainment/".to_string(),
            article_suffix: ".html".to_string(),
            link_regions: vec![
                "#Col1-1-Hero-Proxy a".to_string(),
                "#YDC-Stream a".to_string(),
            ],
            article_container: r#"article[id^="article-"]"#.to_string(),
            json_ld: r#"script[type="application/ld+json"]"#.to_string(),
            primary_image: "img".to_string(),
        }
    }
}

/// Admission policy knobs. Compiled into an
/// [`AdmissionPolicy`](crate::filter::AdmissionPolicy) before a run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Case-insensitive token marking self-published articles.
    pub brand_token: String,
    /// Target timezone as a fixed offset, e.g. `+08:00`.
    pub utc_offset: String,
    /// Earliest accepted local publish time on the run date, `HH:MM`.
    pub cutoff: String,
    /// Headline prefix length, in characters, used for near-duplicate suppression.
    pub fingerprint_chars: usize,
    pub quota: usize,
    /// Regex patterns matched against the body. Prefix with `(?i)` for
    /// case-insensitive terms.
    pub denylist: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            brand_token: "yahoo".to_string(),
            utc_offset: "+08:00".to_string(),
            cutoff: "14:00".to_string(),
            fingerprint_chars: 7,
            quota: 10,
            denylist: ["AV", "性侵", "犯罪", "逮捕"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Pacing and page-readiness settings for the single browser session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub navigation_timeout_secs: u64,
    /// Pause between candidate fetches.
    pub request_delay_ms: u64,
    /// Scroll-to-bottom passes on the listing page before links are collected.
    pub scroll_passes: usize,
    pub scroll_settle_ms: u64,
    /// Upper bound on candidates taken from the listing page. `None` means all.
    pub max_candidates: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 60,
            request_delay_ms: 1000,
            scroll_passes: 2,
            scroll_settle_ms: 1500,
            max_candidates: None,
        }
    }
}

impl Config {
    /// Load from a YAML file, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}
