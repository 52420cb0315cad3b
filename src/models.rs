//! Data models for scraped articles and the persisted daily snapshot.
//!
//! - [`ArticleMetadata`]: fields read out of an article's JSON-LD block
//! - [`ArticleRecord`]: one extracted article; the unit that gets persisted
//! - [`Snapshot`]: everything one run accepted for one calendar date
//!
//! The serialized field names (`headLine`, `newsInfo`, ...) are the format the
//! review dashboard reads, so they are fixed by serde renames rather than by
//! the Rust field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata parsed from an article page's `application/ld+json` block.
///
/// A missing or unparsable block yields [`ArticleMetadata::default`]; every
/// string is then empty and `date_published` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub headline: String,
    pub author_name: String,
    pub provider_name: String,
    pub date_published: Option<String>,
}

impl ArticleMetadata {
    /// Parse raw JSON-LD text. Never fails: bad input gives empty metadata.
    ///
    /// `author` may be an object, an array of objects, or a bare string. The
    /// provider falls back to `publisher` when `provider` is absent. When the
    /// block is a top-level array (or an `@graph`), the first node carrying a
    /// `headline` is used.
    pub fn from_json_ld(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Self::default();
        };
        let Some(node) = article_node(&value) else {
            return Self::default();
        };

        Self {
            headline: string_field(node.get("headline")),
            author_name: name_of(node.get("author")),
            provider_name: match name_of(node.get("provider")) {
                name if name.is_empty() => name_of(node.get("publisher")),
                name => name,
            },
            date_published: node
                .get("datePublished")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

fn article_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => match map.get("@graph") {
            Some(graph) if !map.contains_key("headline") => article_node(graph),
            _ => Some(value),
        },
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("headline").is_some())
            .or_else(|| items.first()),
        _ => None,
    }
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn name_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(obj)) => string_field(obj.get("name")),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| name_of(Some(item)))
            .find(|name| !name.is_empty())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// An extracted article.
///
/// Produced for every candidate the extractor can navigate to; only records
/// that pass every admission stage end up in a [`Snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Absolute URL of the article page.
    pub link: String,
    pub head_line: String,
    /// ISO-8601 timestamp exactly as the source published it. Empty when absent.
    pub publish_date: String,
    /// Raw JSON-LD text, kept for audit. Empty when the page had none.
    pub source: String,
    pub content: String,
    pub image_url: Option<String>,
    /// Caption text next to the primary image, usually a photo credit.
    pub image_provider: Option<String>,
    pub author_name: String,
    pub news_provider: String,
}

impl ArticleRecord {
    /// Assemble a candidate from its independently extracted parts.
    pub fn from_parts(
        link: &str,
        source: String,
        content: String,
        image_url: Option<String>,
        image_provider: Option<String>,
    ) -> Self {
        let meta = ArticleMetadata::from_json_ld(&source);
        Self {
            link: link.to_string(),
            head_line: meta.headline,
            publish_date: meta.date_published.unwrap_or_default(),
            source,
            content,
            image_url,
            image_provider,
            author_name: meta.author_name,
            news_provider: meta.provider_name,
        }
    }
}

/// The persisted output of one run, one per calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `YYYY-MM-DD` in the target timezone.
    pub date: String,
    /// Accepted records in acceptance order.
    pub news_info: Vec<ArticleRecord>,
    pub generated_at: String,
}
