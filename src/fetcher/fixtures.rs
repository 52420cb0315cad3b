//! In-memory page driver for tests.

use super::{NavigateOptions, Page, PageDriver};
use crate::error::FetchError;
use std::collections::HashMap;
use tokio::time::Instant;

/// Serves canned HTML per URL and records every navigation.
#[derive(Debug, Default)]
pub struct FixtureDriver {
    pages: HashMap<String, String>,
    pub visits: Vec<String>,
    /// When each entry in `visits` happened.
    pub visited_at: Vec<Instant>,
    pub scrolled: Vec<String>,
    pub closed: bool,
}

impl FixtureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }
}

impl PageDriver for FixtureDriver {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<Page, FetchError> {
        self.visits.push(url.to_string());
        self.visited_at.push(Instant::now());
        if options.scroll.is_some() {
            self.scrolled.push(url.to_string());
        }
        match self.pages.get(url) {
            Some(html) => Ok(Page {
                url: url.to_string(),
                html: html.clone(),
            }),
            None => Err(FetchError::Timeout(options.timeout.as_secs())),
        }
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Article page in the source site's markup.
pub fn article_html(json_ld: &str, body: &str, image: Option<(&str, &str)>) -> String {
    let image = match image {
        Some((src, caption)) => format!(
            r#"<figure><img src="{src}" alt=""><figcaption>{caption}</figcaption></figure>"#
        ),
        None => String::new(),
    };
    format!(
        r#"<html><head><title>t</title></head><body>
<article id="article-0001">
  <script type="application/ld+json">{json_ld}</script>
  <header><h1>ignored chrome</h1></header>
  {image}
  <div class="caas-body"><p>{body}</p></div>
</article>
</body></html>"#
    )
}

/// JSON-LD block for an article.
pub fn json_ld(headline: &str, author: &str, provider: &str, published: &str) -> String {
    serde_json::json!({
        "@context": "https://schema.org",
        "@type": "NewsArticle",
        "headline": headline,
        "author": { "@type": "Person", "name": author },
        "provider": { "@type": "Organization", "name": provider },
        "datePublished": published,
    })
    .to_string()
}
