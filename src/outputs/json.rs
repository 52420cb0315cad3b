//! Snapshot store: one JSON file per calendar date.
//!
//! ```text
//! output_dir/
//! ├── 2025-11-04.json
//! ├── 2025-11-05.json
//! └── review/
//!     └── 2025-11-05.json   # review ledger, see crate::review
//! ```
//!
//! A run replaces its date's file in full. The new contents go to a temporary
//! sibling first and are renamed over the old file, so readers never see a
//! half-written snapshot.

use crate::models::{ArticleRecord, Snapshot};
use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// `<dir>/<date>.json`
pub fn snapshot_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{date}.json"))
}

/// Build the snapshot for `date` and write it, replacing any earlier one.
///
/// Returns the path written. Any failure is returned; a run that cannot
/// persist has failed.
#[instrument(level = "info", skip(records, dir), fields(dir = %dir.display(), count = records.len()))]
pub async fn persist(
    dir: &Path,
    date: NaiveDate,
    records: Vec<ArticleRecord>,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let snapshot = Snapshot {
        date: date.to_string(),
        news_info: records,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    write_snapshot(&snapshot, date, dir).await
}

/// Write `snapshot` to `<dir>/<date>.json`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %date))]
pub async fn write_snapshot(snapshot: &Snapshot, date: NaiveDate, dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    if let Err(e) = fs::create_dir_all(dir).await {
        error!(error = %e, "Failed to create snapshot dir");
        return Err(e.into());
    }

    let path = snapshot_path(dir, date);
    let staging = dir.join(format!(".{date}.json.tmp"));
    if let Err(e) = fs::write(&staging, json).await {
        error!(path = %staging.display(), error = %e, "Failed to stage snapshot");
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staging, &path).await {
        error!(path = %path.display(), error = %e, "Failed to move snapshot into place");
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    info!(path = %path.display(), articles = snapshot.news_info.len(), "Wrote snapshot");
    Ok(path)
}

/// Read the snapshot for `date`. A missing file is `Ok(None)`.
#[instrument(level = "info", skip(dir), fields(dir = %dir.display()))]
pub async fn load_snapshot(dir: &Path, date: NaiveDate) -> Result<Option<Snapshot>, Box<dyn Error>> {
    let path = snapshot_path(dir, date);
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No snapshot for date");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Snapshots for `today` and the `days - 1` days before it, newest first.
/// Dates without a file are skipped.
#[instrument(level = "info", skip(dir), fields(dir = %dir.display()))]
pub async fn recent_snapshots(dir: &Path, today: NaiveDate, days: u32) -> Result<Vec<Snapshot>, Box<dyn Error>> {
    let mut snapshots = Vec::new();
    for back in 0..days {
        let Some(date) = today.checked_sub_days(Days::new(back.into())) else {
            break;
        };
        if let Some(snapshot) = load_snapshot(dir, date).await? {
            snapshots.push(snapshot);
        }
    }
    info!(found = snapshots.len(), days, "Loaded recent snapshots");
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> ArticleRecord {
        ArticleRecord {
            link: format!("https://tw.news.yahoo.com/story-{n}.html"),
            head_line: format!("第{n}則新聞標題"),
            publish_date: "2025-11-05T07:00:00.000Z".to_string(),
            author_name: "記者".to_string(),
            news_provider: "中央社".to_string(),
            ..ArticleRecord::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 5).unwrap()
    }

    #[tokio::test]
    async fn test_persist_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("docs").join("daily-entertainment");

        let path = persist(&dir, date(), vec![record(1), record(2)], Utc::now()).await.unwrap();
        assert_eq!(path, dir.join("2025-11-05.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["date"], "2025-11-05");
        assert_eq!(value["newsInfo"].as_array().unwrap().len(), 2);
        assert_eq!(value["newsInfo"][0]["headLine"], "第1則新聞標題");
        assert!(value["generatedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_second_run_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        persist(dir, date(), vec![record(1), record(2), record(3)], Utc::now()).await.unwrap();
        persist(dir, date(), vec![record(9)], Utc::now()).await.unwrap();

        let snapshot = load_snapshot(dir, date()).await.unwrap().unwrap();
        assert_eq!(snapshot.news_info, vec![record(9)]);

        let leftovers: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "staging file left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_snapshot(tmp.path(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("2025-11-05.json"), "{\"date\": ").unwrap();
        assert!(load_snapshot(tmp.path(), date()).await.is_err());
    }

    #[tokio::test]
    async fn test_persist_into_unwritable_location_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        assert!(persist(&blocker, date(), vec![record(1)], Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_staging_keeps_previous_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        persist(dir, date(), vec![record(1)], Utc::now()).await.unwrap();

        // A directory squatting on the staging name makes the write fail.
        std::fs::create_dir(dir.join(".2025-11-05.json.tmp")).unwrap();
        assert!(persist(dir, date(), vec![record(2)], Utc::now()).await.is_err());

        let snapshot = load_snapshot(dir, date()).await.unwrap().unwrap();
        assert_eq!(snapshot.news_info, vec![record(1)]);
    }

    #[tokio::test]
    async fn test_recent_snapshots_skips_gaps() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let today = date();
        persist(dir, today, vec![record(1)], Utc::now()).await.unwrap();
        persist(dir, today - Days::new(2), vec![record(2), record(3)], Utc::now()).await.unwrap();
        persist(dir, today - Days::new(9), vec![record(4)], Utc::now()).await.unwrap();

        let recent = recent_snapshots(dir, today, 7).await.unwrap();
        let dates: Vec<_> = recent.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-11-05", "2025-11-03"]);
    }
}
