//! Admission Filter: decide whether an extracted article enters the snapshot.
//!
//! Stages run in a fixed order and the first rejection short-circuits:
//!
//! 1. **Provenance**: author or provider contains the site's own brand
//! 2. **Headline presence**: empty headline
//! 3. **Recency**: not published today (target timezone) or before the cutoff
//! 4. **Near-duplicate**: headline prefix already accepted this run
//! 5. **Sensitive keyword**: body matches a denylist pattern
//! 6. **Quota**: the run is already full, stop processing altogether
//!
//! [`AdmissionPolicy::admit`] is pure; accepting a record into the
//! [`RunState`] is a separate step taken by the run loop.

use crate::config::AdmissionConfig;
use crate::models::ArticleRecord;
use crate::utils::{parse_utc_offset, truncate_for_log};
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use tracing::debug;

/// The stage that turned a candidate away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Provenance,
    HeadlinePresence,
    Recency,
    NearDuplicate,
    SensitiveKeyword,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Provenance => "provenance",
            Stage::HeadlinePresence => "headline_presence",
            Stage::Recency => "recency",
            Stage::NearDuplicate => "near_duplicate",
            Stage::SensitiveKeyword => "sensitive_keyword",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(Stage),
    /// Quota reached: no further candidates are processed this run.
    StopRun,
}

/// Compiled admission settings.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    brand_token: String,
    offset: FixedOffset,
    cutoff: NaiveTime,
    fingerprint_chars: usize,
    quota: usize,
    denylist: Vec<Regex>,
}

impl AdmissionPolicy {
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, Box<dyn Error>> {
        let offset = parse_utc_offset(&config.utc_offset)
            .ok_or_else(|| format!("invalid utc_offset {:?}", config.utc_offset))?;
        let cutoff = NaiveTime::parse_from_str(config.cutoff.trim(), "%H:%M")
            .map_err(|e| format!("invalid cutoff {:?}: {e}", config.cutoff))?;
        let denylist = config
            .denylist
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            brand_token: config.brand_token.trim().to_lowercase(),
            offset,
            cutoff,
            fingerprint_chars: config.fingerprint_chars,
            quota: config.quota,
            denylist,
        })
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Headline prefix used for near-duplicate suppression.
    pub fn fingerprint(&self, headline: &str) -> String {
        headline.chars().take(self.fingerprint_chars).collect()
    }

    /// Run every stage against `candidate` in order.
    ///
    /// `now` is the run's clock; it is converted to the target timezone to
    /// decide what "today" means.
    pub fn admit(&self, candidate: &ArticleRecord, state: &RunState, now: DateTime<FixedOffset>) -> Decision {
        let link = candidate.link.as_str();

        if self.is_self_published(&[candidate.author_name.as_str(), candidate.news_provider.as_str()]) {
            debug!(%link, author = %candidate.author_name, provider = %candidate.news_provider, stage = %Stage::Provenance, "Rejected");
            return Decision::Reject(Stage::Provenance);
        }

        if candidate.head_line.trim().is_empty() {
            debug!(%link, stage = %Stage::HeadlinePresence, "Rejected");
            return Decision::Reject(Stage::HeadlinePresence);
        }

        if let Err(reason) = self.check_recency(&candidate.publish_date, now) {
            debug!(%link, published = %candidate.publish_date, reason, stage = %Stage::Recency, "Rejected");
            return Decision::Reject(Stage::Recency);
        }

        let fingerprint = self.fingerprint(&candidate.head_line);
        if state.has_fingerprint(&fingerprint) {
            debug!(%link, %fingerprint, stage = %Stage::NearDuplicate, "Rejected");
            return Decision::Reject(Stage::NearDuplicate);
        }

        if let Some(pattern) = self.sensitive_match(&candidate.content) {
            debug!(%link, pattern, headline = %truncate_for_log(&candidate.head_line, 40), stage = %Stage::SensitiveKeyword, "Rejected");
            return Decision::Reject(Stage::SensitiveKeyword);
        }

        if state.len() >= self.quota {
            debug!(%link, quota = self.quota, "Quota reached");
            return Decision::StopRun;
        }

        Decision::Accept
    }

    /// True when any of `names` contains the brand token, case-insensitively.
    pub fn is_self_published(&self, names: &[&str]) -> bool {
        !self.brand_token.is_empty()
            && names
                .iter()
                .any(|name| name.to_lowercase().contains(&self.brand_token))
    }

    /// Same-day and not before the cutoff, both in the target timezone.
    pub fn check_recency(&self, published: &str, now: DateTime<FixedOffset>) -> Result<(), &'static str> {
        let published = published.trim();
        if published.is_empty() {
            return Err("no publish timestamp");
        }
        let published = self.parse_timestamp(published).ok_or("unparsable publish timestamp")?;

        let local = published.with_timezone(&self.offset);
        let today = now.with_timezone(&self.offset).date_naive();
        if local.date_naive() != today {
            return Err("not published today");
        }
        if local.time() < self.cutoff {
            return Err("published before cutoff");
        }
        Ok(())
    }

    /// RFC 3339, or a bare local datetime read in the target timezone.
    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts);
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()?
            .and_local_timezone(self.offset)
            .single()
    }

    /// First denylist pattern found in `content`.
    pub fn sensitive_match(&self, content: &str) -> Option<&str> {
        self.denylist
            .iter()
            .find(|re| re.is_match(content))
            .map(Regex::as_str)
    }
}

/// Transient per-run state, mutated only by the run loop.
#[derive(Debug, Default)]
pub struct RunState {
    accepted: Vec<ArticleRecord>,
    seen_links: HashSet<String>,
    fingerprints: HashSet<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit; false if `link` was already seen this run.
    pub fn mark_seen(&mut self, link: &str) -> bool {
        self.seen_links.insert(link.to_string())
    }

    pub fn has_fingerprint(&self, fingerprint: &str) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn accept(&mut self, record: ArticleRecord, policy: &AdmissionPolicy) {
        self.fingerprints.insert(policy.fingerprint(&record.head_line));
        self.accepted.push(record);
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn is_full(&self, policy: &AdmissionPolicy) -> bool {
        self.accepted.len() >= policy.quota
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AdmissionPolicy {
        AdmissionPolicy::from_config(&AdmissionConfig::default()).unwrap()
    }

    /// 18:00 on 2025-11-05 in Taipei.
    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-11-05T18:00:00+08:00").unwrap()
    }

    fn candidate(headline: &str, published: &str) -> ArticleRecord {
        ArticleRecord {
            link: format!("https://tw.news.yahoo.com/{}.html", headline.len()),
            head_line: headline.to_string(),
            publish_date: published.to_string(),
            content: "一般娛樂新聞內文".to_string(),
            author_name: "記者王小明".to_string(),
            news_provider: "三立新聞網".to_string(),
            ..ArticleRecord::default()
        }
    }

    #[test]
    fn test_accepts_fresh_external_article() {
        let c = candidate("新片首映會星光熠熠", "2025-11-05T15:00:00+08:00");
        assert_eq!(policy().admit(&c, &RunState::new(), now()), Decision::Accept);
    }

    #[test]
    fn test_provenance_rejects_brand_author_before_recency() {
        // Also stale, but provenance runs first.
        let mut c = candidate("自製新聞標題測試", "2020-01-01T00:00:00Z");
        c.author_name = "Yahoo 編輯室".to_string();
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::Provenance)
        );

        let mut c = candidate("自製新聞標題測試", "2025-11-05T15:00:00+08:00");
        c.news_provider = "YAHOO奇摩（即時新聞）".to_string();
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::Provenance)
        );
    }

    #[test]
    fn test_empty_structured_data_rejected_at_headline() {
        let c = ArticleRecord::from_parts(
            "https://tw.news.yahoo.com/x.html",
            String::new(),
            "body".to_string(),
            None,
            None,
        );
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::HeadlinePresence)
        );
    }

    #[test]
    fn test_recency_rejects_yesterday() {
        let c = candidate("昨晚的新聞標題", "2025-11-04T23:00:00+08:00");
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::Recency)
        );
    }

    #[test]
    fn test_recency_rejects_before_cutoff() {
        let c = candidate("中午的新聞標題", "2025-11-05T13:00:00+08:00");
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::Recency)
        );
    }

    #[test]
    fn test_recency_converts_utc_to_target_timezone() {
        let policy = policy();
        // 06:30Z is 14:30 in Taipei.
        assert!(policy.check_recency("2025-11-05T06:30:00.000Z", now()).is_ok());
        // 05:59Z is 13:59 in Taipei.
        assert_eq!(
            policy.check_recency("2025-11-05T05:59:00Z", now()),
            Err("published before cutoff")
        );
        // 16:30Z on the 4th is 00:30 on the 5th in Taipei, before the cutoff.
        assert!(policy.check_recency("2025-11-04T16:30:00Z", now()).is_err());
        // Exactly the cutoff counts.
        assert!(policy.check_recency("2025-11-05T14:00:00", now()).is_ok());
        assert_eq!(policy.check_recency("", now()), Err("no publish timestamp"));
        assert_eq!(policy.check_recency("yesterday", now()), Err("unparsable publish timestamp"));
    }

    #[test]
    fn test_near_duplicate_headline_prefix() {
        let policy = policy();
        let mut state = RunState::new();
        let first = candidate("金馬獎入圍名單公布：影帝之爭", "2025-11-05T15:00:00+08:00");
        assert_eq!(policy.admit(&first, &state, now()), Decision::Accept);
        state.accept(first, &policy);

        let second = candidate("金馬獎入圍名單公布－影后懸念", "2025-11-05T16:00:00+08:00");
        assert_eq!(
            policy.admit(&second, &state, now()),
            Decision::Reject(Stage::NearDuplicate)
        );

        let third = candidate("金馬獎頒獎典禮紅毯直擊", "2025-11-05T16:00:00+08:00");
        assert_eq!(policy.admit(&third, &state, now()), Decision::Accept);
    }

    #[test]
    fn test_fingerprint_counts_chars() {
        assert_eq!(policy().fingerprint("金馬獎入圍名單公布：..."), "金馬獎入圍名單");
        assert_eq!(policy().fingerprint("短"), "短");
    }

    #[test]
    fn test_sensitive_keyword() {
        let mut c = candidate("藝人涉案遭警方帶走", "2025-11-05T15:00:00+08:00");
        c.content = "警方今日以涉嫌犯罪將其逮捕".to_string();
        assert_eq!(
            policy().admit(&c, &RunState::new(), now()),
            Decision::Reject(Stage::SensitiveKeyword)
        );
        assert_eq!(policy().sensitive_match(&c.content), Some("犯罪"));
        // Default terms are case-sensitive.
        assert_eq!(policy().sensitive_match("av club review"), None);
    }

    #[test]
    fn test_case_insensitive_denylist_term() {
        let config = AdmissionConfig {
            denylist: vec!["(?i)scandal".to_string()],
            ..AdmissionConfig::default()
        };
        let policy = AdmissionPolicy::from_config(&config).unwrap();
        assert_eq!(policy.sensitive_match("A SCANDAL erupts"), Some("(?i)scandal"));
    }

    #[test]
    fn test_quota_stops_run() {
        let config = AdmissionConfig {
            quota: 1,
            ..AdmissionConfig::default()
        };
        let policy = AdmissionPolicy::from_config(&config).unwrap();
        let mut state = RunState::new();
        state.accept(candidate("第一則入選新聞", "2025-11-05T15:00:00+08:00"), &policy);
        assert!(state.is_full(&policy));

        let next = candidate("另一則不同新聞", "2025-11-05T15:00:00+08:00");
        assert_eq!(policy.admit(&next, &state, now()), Decision::StopRun);

        // Rejections still win over the quota signal.
        let stale = candidate("另一則舊的新聞", "2025-11-01T15:00:00+08:00");
        assert_eq!(policy.admit(&stale, &state, now()), Decision::Reject(Stage::Recency));
    }

    #[test]
    fn test_invalid_config() {
        let bad_offset = AdmissionConfig {
            utc_offset: "Asia/Taipei".to_string(),
            ..AdmissionConfig::default()
        };
        assert!(AdmissionPolicy::from_config(&bad_offset).is_err());

        let bad_cutoff = AdmissionConfig {
            cutoff: "2pm".to_string(),
            ..AdmissionConfig::default()
        };
        assert!(AdmissionPolicy::from_config(&bad_cutoff).is_err());

        let bad_pattern = AdmissionConfig {
            denylist: vec!["(".to_string()],
            ..AdmissionConfig::default()
        };
        assert!(AdmissionPolicy::from_config(&bad_pattern).is_err());
    }

    #[test]
    fn test_mark_seen() {
        let mut state = RunState::new();
        assert!(state.mark_seen("https://tw.news.yahoo.com/a.html"));
        assert!(!state.mark_seen("https://tw.news.yahoo.com/a.html"));
        assert!(state.is_empty());
    }
}
