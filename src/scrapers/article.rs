//! Article Extractor: one candidate URL in, one [`ArticleRecord`] out.
//!
//! Navigation is the only step that can abandon a candidate. Everything after
//! it degrades independently: a missing JSON-LD block, body or image leaves
//! that field empty and extraction carries on. Incomplete records are then
//! turned away by the admission filter.

use super::compile;
use crate::config::SiteConfig;
use crate::fetcher::{NavigateOptions, PageDriver};
use crate::models::ArticleRecord;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

/// Compiled selector conventions for article pages.
#[derive(Debug, Clone)]
pub struct ArticleSelectors {
    container: Selector,
    json_ld: Selector,
    image: Selector,
}

impl ArticleSelectors {
    pub fn new(site: &SiteConfig) -> Result<Self, String> {
        Ok(Self {
            container: compile(&site.article_container)?,
            json_ld: compile(&site.json_ld)?,
            image: compile(&site.primary_image)?,
        })
    }
}

/// Elements whose text never counts as article body.
const NON_BODY: &[&str] = &["script", "style", "noscript", "template"];

/// Build a candidate record from an already rendered article page.
pub fn parse_article(link: &str, page_url: &str, document: &Html, selectors: &ArticleSelectors) -> ArticleRecord {
    let Some(container) = document.select(&selectors.container).next() else {
        debug!(%link, "Article container not found");
        return ArticleRecord::from_parts(link, String::new(), String::new(), None, None);
    };

    let source = container
        .select(&selectors.json_ld)
        .next()
        .map(|script| script.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let content = visible_text(container);

    let (image_url, image_provider) = match container.select(&selectors.image).next() {
        Some(img) => (image_src(img, page_url), caption_after(img)),
        None => (None, None),
    };

    ArticleRecord::from_parts(link, source, content, image_url, image_provider)
}

/// Text of `element`, skipping script-like descendants, whitespace-normalized.
pub fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let inside_non_body = node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|el| NON_BODY.contains(&el.name()));
            (!inside_non_body).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
        .join(" ")
}

fn image_src(img: ElementRef<'_>, page_url: &str) -> Option<String> {
    let raw = ["src", "data-src"]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))?;
    match Url::parse(page_url).and_then(|base| base.join(raw)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(raw.to_string()),
    }
}

/// Caption of the first element sibling following the image.
fn caption_after(img: ElementRef<'_>) -> Option<String> {
    let sibling = img.next_siblings().find_map(ElementRef::wrap)?;
    let text = visible_text(sibling);
    (!text.is_empty()).then_some(text)
}

/// Navigate to `link` and extract a candidate record.
///
/// Returns `None` when navigation fails; the caller moves on to the next
/// candidate.
#[instrument(level = "info", skip_all, fields(%link))]
pub async fn extract_article<D: PageDriver>(
    driver: &mut D,
    link: &str,
    selectors: &ArticleSelectors,
    options: &NavigateOptions,
) -> Option<ArticleRecord> {
    let page = match driver.navigate(link, options).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "Navigation failed; skipping candidate");
            return None;
        }
    };

    let record = parse_article(link, &page.url, &page.document(), selectors);
    debug!(
        headline = %truncate_for_log(&record.head_line, 40),
        body_chars = record.content.chars().count(),
        has_image = record.image_url.is_some(),
        "Extracted article"
    );
    Some(record)
}
