//! Editorial review status for the articles of a snapshot.
//!
//! Each article moves through a small workflow:
//!
//! ```text
//! unprocessed ──► selected-pic ──► completed
//!      │      └─► selected-sta ──┘     │
//!      └──► rejected                   │
//!  ◄───────────── (undo) ──────────────┘
//! ```
//!
//! Statuses live in a per-date ledger next to the snapshots
//! (`<output_dir>/review/<date>.json`), keyed by article link. Articles
//! without an entry are `unprocessed`.

use crate::error::ReviewError;
use crate::models::Snapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    #[default]
    Unprocessed,
    /// Picked for the picture slot.
    SelectedPic,
    /// Picked for the story slot.
    SelectedSta,
    Completed,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::Unprocessed,
        ReviewStatus::SelectedPic,
        ReviewStatus::SelectedSta,
        ReviewStatus::Completed,
        ReviewStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Unprocessed => "unprocessed",
            ReviewStatus::SelectedPic => "selected-pic",
            ReviewStatus::SelectedSta => "selected-sta",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn can_move_to(self, to: ReviewStatus) -> bool {
        use ReviewStatus::*;
        matches!(
            (self, to),
            (Unprocessed, SelectedPic | SelectedSta | Rejected)
                | (SelectedPic | SelectedSta, Completed | Unprocessed)
                | (Completed | Rejected, Unprocessed)
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review statuses for one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewLedger {
    pub date: String,
    pub statuses: BTreeMap<String, ReviewStatus>,
}

impl ReviewLedger {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: date.to_string(),
            statuses: BTreeMap::new(),
        }
    }

    pub fn status_of(&self, link: &str) -> ReviewStatus {
        self.statuses.get(link).copied().unwrap_or_default()
    }

    /// Move the article at `link` to `to`. Returns the previous status.
    pub fn transition(
        &mut self,
        snapshot: &Snapshot,
        link: &str,
        to: ReviewStatus,
    ) -> Result<ReviewStatus, ReviewError> {
        if !snapshot.news_info.iter().any(|r| r.link == link) {
            return Err(ReviewError::UnknownArticle(link.to_string()));
        }
        let from = self.status_of(link);
        if !from.can_move_to(to) {
            return Err(ReviewError::InvalidTransition { from, to });
        }
        if to == ReviewStatus::Unprocessed {
            self.statuses.remove(link);
        } else {
            self.statuses.insert(link.to_string(), to);
        }
        Ok(from)
    }

    /// Article count per status, in [`ReviewStatus::ALL`] order.
    pub fn counts(&self, snapshot: &Snapshot) -> Vec<(ReviewStatus, usize)> {
        let mut counts: BTreeMap<ReviewStatus, usize> = BTreeMap::new();
        for record in &snapshot.news_info {
            *counts.entry(self.status_of(&record.link)).or_default() += 1;
        }
        ReviewStatus::ALL
            .iter()
            .map(|status| (*status, counts.get(status).copied().unwrap_or(0)))
            .collect()
    }
}

/// `<dir>/review/<date>.json`
pub fn ledger_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join("review").join(format!("{date}.json"))
}

/// Load the ledger for `date`; a missing file is an empty ledger.
#[instrument(level = "info", skip(dir), fields(dir = %dir.display()))]
pub async fn load_ledger(dir: &Path, date: NaiveDate) -> Result<ReviewLedger, Box<dyn Error>> {
    match fs::read_to_string(ledger_path(dir, date)).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ReviewLedger::new(date)),
        Err(e) => Err(e.into()),
    }
}

#[instrument(level = "info", skip_all, fields(dir = %dir.display(), date = %ledger.date))]
pub async fn save_ledger(dir: &Path, ledger: &ReviewLedger) -> Result<PathBuf, Box<dyn Error>> {
    let date: NaiveDate = ledger.date.parse()?;
    let path = ledger_path(dir, date);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, serde_json::to_string_pretty(ledger)?).await?;
    info!(path = %path.display(), entries = ledger.statuses.len(), "Saved review ledger");
    Ok(path)
}
