//! Link Collector: candidate article URLs from the listing page.
//!
//! Each configured region (hero, stream, ...) is queried for anchors. Hrefs
//! are resolved against the canonical origin, kept only when they point at an
//! article page on the news host, and collapsed to one entry per URL.

use super::compile;
use crate::config::{FetchConfig, SiteConfig};
use crate::error::FetchError;
use crate::fetcher::{NavigateOptions, PageDriver};
use itertools::Itertools;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Which hrefs count as article links, and how relative ones are resolved.
#[derive(Debug, Clone)]
pub struct LinkRules {
    origin: Url,
    news_host: String,
    article_suffix: String,
}

impl LinkRules {
    pub fn new(site: &SiteConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            origin: Url::parse(&site.origin)?,
            news_host: site.news_host.to_ascii_lowercase(),
            article_suffix: site.article_suffix.clone(),
        })
    }

    /// Resolve `href` and return it if it is an article page on the news host.
    ///
    /// Fragments are dropped so in-page anchors do not produce extra entries.
    pub fn normalize(&self, href: &str) -> Option<String> {
        let mut resolved = self.origin.join(href.trim()).ok()?;
        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }
        if resolved.host_str()? != self.news_host {
            return None;
        }
        if !resolved.path().ends_with(&self.article_suffix) {
            return None;
        }
        resolved.set_fragment(None);
        Some(resolved.to_string())
    }
}

/// Raw hrefs of every anchor matched by `selector`.
///
/// A region that is absent from the page, or a selector that does not parse,
/// yields an empty list.
pub fn region_hrefs(document: &Html, selector: &str) -> Vec<String> {
    let selector = match compile(selector) {
        Ok(selector) => selector,
        Err(e) => {
            warn!(error = %e, "Skipping link region");
            return Vec::new();
        }
    };
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Union the article links of all regions, first appearance wins.
pub fn collect_links(document: &Html, regions: &[String], rules: &LinkRules) -> Vec<String> {
    regions
        .iter()
        .flat_map(|region| {
            let hrefs = region_hrefs(document, region);
            debug!(%region, raw = hrefs.len(), "Queried link region");
            hrefs
        })
        .filter_map(|href| rules.normalize(&href))
        .unique()
        .collect()
}

/// Load the listing page (scrolling first to surface lazy content) and
/// collect candidate article URLs.
///
/// Failing to load the listing page leaves nothing to process, so the error
/// is returned to the caller.
#[instrument(level = "info", skip_all, fields(listing = %site.listing_url))]
pub async fn index_articles<D: PageDriver>(
    driver: &mut D,
    site: &SiteConfig,
    fetch: &FetchConfig,
    rules: &LinkRules,
) -> Result<Vec<String>, FetchError> {
    let options = NavigateOptions::listing(
        Duration::from_secs(fetch.navigation_timeout_secs),
        fetch.scroll_passes,
        Duration::from_millis(fetch.scroll_settle_ms),
    );
    let page = driver.navigate(&site.listing_url, &options).await?;
    let mut links = collect_links(&page.document(), &site.link_regions, rules);

    if let Some(max) = fetch.max_candidates {
        links.truncate(max);
    }

    info!(count = links.len(), "Indexed article URLs");
    debug!(urls = ?links, "Candidate links");
    Ok(links)
}
