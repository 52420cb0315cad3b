//! Listing-page and article-page scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing** ([`links`]): collect candidate article URLs from the named
//!    regions of the listing page
//! 2. **Extraction** ([`article`]): pull JSON-LD metadata, body text and the
//!    primary image out of each article page
//!
//! Both phases drive a [`PageDriver`](crate::fetcher::PageDriver) and run DOM
//! queries locally with `scraper`. Selector conventions come from
//! [`SiteConfig`](crate::config::SiteConfig) and are a contract with the
//! source site's markup.

pub mod article;
pub mod links;

use scraper::Selector;

/// Compile a selector from configuration.
pub(crate) fn compile(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector {selector:?}: {e}"))
}
