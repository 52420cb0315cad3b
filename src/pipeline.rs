//! The daily scrape run: collect → extract → filter → accumulate → persist.
//!
//! Strictly sequential. One session, one page at a time, with a fixed pause
//! between candidate fetches. The loop ends when the candidate queue is
//! exhausted or the admission filter signals that the quota is reached;
//! candidates after that point are never fetched.

use crate::config::{Config, FetchConfig, SiteConfig};
use crate::error::FetchError;
use crate::fetcher::{NavigateOptions, PageDriver};
use crate::filter::{AdmissionPolicy, Decision, RunState, Stage};
use crate::models::ArticleRecord;
use crate::outputs::json;
use crate::scrapers::article::{extract_article, ArticleSelectors};
use crate::scrapers::links::{index_articles, LinkRules};
use crate::utils::truncate_for_log;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Everything a run needs, compiled from [`Config`] up front so that bad
/// selectors or patterns fail before the session is opened.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub policy: AdmissionPolicy,
    rules: LinkRules,
    selectors: ArticleSelectors,
}

impl RunPlan {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            site: config.site.clone(),
            fetch: config.fetch.clone(),
            policy: AdmissionPolicy::from_config(&config.admission)?,
            rules: LinkRules::new(&config.site)?,
            selectors: ArticleSelectors::new(&config.site)?,
        })
    }

    /// Current time in the target timezone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.policy.offset())
    }
}

/// What a run produced, for logging and tests.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub records: Vec<ArticleRecord>,
    pub candidates: usize,
    pub fetched: usize,
    pub failed: usize,
    pub rejected: BTreeMap<Stage, usize>,
    pub reached_quota: bool,
}

/// Index the listing page and process candidates until the queue runs out
/// or the quota is reached.
///
/// Only a listing-page failure is returned as an error; per-candidate
/// failures are logged and skipped.
#[instrument(level = "info", skip_all, fields(date = %now.date_naive()))]
pub async fn run<D: PageDriver>(
    driver: &mut D,
    plan: &RunPlan,
    now: DateTime<FixedOffset>,
) -> Result<RunOutcome, FetchError> {
    let links = index_articles(driver, &plan.site, &plan.fetch, &plan.rules).await?;
    let article_options = NavigateOptions::article(Duration::from_secs(plan.fetch.navigation_timeout_secs));
    let delay = Duration::from_millis(plan.fetch.request_delay_ms);

    let mut state = RunState::new();
    let mut outcome = RunOutcome {
        candidates: links.len(),
        ..RunOutcome::default()
    };

    for link in &links {
        if state.is_full(&plan.policy) {
            outcome.reached_quota = true;
            break;
        }
        if !state.mark_seen(link) {
            continue;
        }
        if outcome.fetched + outcome.failed > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        let Some(candidate) = extract_article(driver, link, &plan.selectors, &article_options).await else {
            outcome.failed += 1;
            continue;
        };
        outcome.fetched += 1;

        match plan.policy.admit(&candidate, &state, now) {
            Decision::Accept => {
                info!(
                    %link,
                    headline = %truncate_for_log(&candidate.head_line, 40),
                    accepted = state.len() + 1,
                    "Accepted article"
                );
                state.accept(candidate, &plan.policy);
            }
            Decision::Reject(stage) => {
                *outcome.rejected.entry(stage).or_default() += 1;
            }
            Decision::StopRun => {
                outcome.reached_quota = true;
                break;
            }
        }
    }

    info!(
        candidates = outcome.candidates,
        fetched = outcome.fetched,
        failed = outcome.failed,
        rejected = ?outcome.rejected,
        accepted = state.len(),
        reached_quota = outcome.reached_quota,
        "Run finished"
    );
    outcome.records = state.into_records();
    Ok(outcome)
}

/// Full daily job: run the pipeline on `driver`, close it, persist the snapshot.
///
/// The session is closed whether or not the run succeeded. Returns the
/// snapshot path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn scrape<D: PageDriver>(
    driver: &mut D,
    plan: &RunPlan,
    output_dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf, Box<dyn Error>> {
    let result = run(driver, plan, now).await;
    driver.close().await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Listing page could not be loaded");
            return Err(e.into());
        }
    };

    let date: NaiveDate = now.date_naive();
    json::persist(output_dir, date, outcome.records, now.with_timezone(&Utc)).await
}
