//! Markdown digest of a snapshot, for reading in a terminal or pasting into
//! an editorial channel.

use crate::models::{ArticleRecord, Snapshot};
use crate::review::{ReviewLedger, ReviewStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use url::Url;

/// Tracking parameter appended to links shared from the digest.
pub const SHARE_NCID: &str = "facebook_twfbtracki_qycu9rbgk0q";

/// Credit wrapped in full- or half-width parentheses, e.g. `（圖／翻攝自IG）`.
static BRACKETED_CREDIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[（(]([^）)]*圖[／/][^）)]*)[）)]").expect("valid regex"));
/// Bare credit fragment, e.g. `圖／記者攝`.
static BARE_CREDIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"圖[／/][^，。]*[^，。]").expect("valid regex"));

/// Photo credit out of an image caption; the caption itself when no credit
/// pattern is present.
pub fn clean_image_provider(caption: &str) -> String {
    if let Some(inner) = BRACKETED_CREDIT.captures(caption).and_then(|c| c.get(1)) {
        return inner.as_str().to_string();
    }
    if let Some(bare) = BARE_CREDIT.find(caption) {
        return bare.as_str().to_string();
    }
    caption.to_string()
}

/// `link` with the share tracking parameter set.
pub fn share_link(link: &str) -> String {
    match Url::parse(link) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "ncid")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("ncid", SHARE_NCID);
            url.to_string()
        }
        Err(_) => format!("{link}?ncid={SHARE_NCID}"),
    }
}

/// Render the digest. With `only` set, just the articles in that status.
pub fn render_digest(snapshot: &Snapshot, ledger: &ReviewLedger, only: Option<ReviewStatus>) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# 每日娛樂新聞 {}\n", snapshot.date);
    let _ = writeln!(
        md,
        "_{} articles, generated {}_\n",
        snapshot.news_info.len(),
        snapshot.generated_at
    );

    let tabs = ledger
        .counts(snapshot)
        .into_iter()
        .map(|(status, n)| format!("{status}: {n}"))
        .collect::<Vec<_>>()
        .join(" · ");
    let _ = writeln!(md, "{tabs}\n");

    let shown: Vec<(usize, &ArticleRecord)> = snapshot
        .news_info
        .iter()
        .enumerate()
        .filter(|(_, r)| only.is_none_or(|status| ledger.status_of(&r.link) == status))
        .collect();

    if shown.is_empty() {
        md.push_str("暫無新聞\n");
        return md;
    }

    for (i, record) in shown {
        write_article(&mut md, i + 1, record, ledger.status_of(&record.link));
    }
    md
}

fn write_article(md: &mut String, n: usize, record: &ArticleRecord, status: ReviewStatus) {
    let _ = writeln!(md, "## {n:02}. {}\n", record.head_line);

    let byline = [record.news_provider.as_str(), record.author_name.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" / ");
    if !byline.is_empty() {
        let _ = writeln!(md, "- **Source:** {byline}");
    }
    let _ = writeln!(md, "- **Published:** {}", record.publish_date);
    let _ = writeln!(md, "- **Status:** {status}");
    let _ = writeln!(md, "- **Share:** <{}>", share_link(&record.link));

    if let Some(ref image) = record.image_url {
        let _ = writeln!(md, "\n![]({image})");
        if let Some(credit) = record.image_provider.as_deref().filter(|c| !c.is_empty()) {
            let _ = writeln!(md, "_{}_", clean_image_provider(credit));
        }
    }
    md.push('\n');
}
