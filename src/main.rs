//! # Daily Entertainment
//!
//! Scrapes the day's entertainment news from a news portal, keeps only
//! externally sourced, same-afternoon, non-duplicate and content-safe
//! articles, and writes them to a per-date JSON snapshot that the review
//! dashboard reads.
//!
//! ## Usage
//!
//! ```sh
//! daily_entertainment scrape
//! daily_entertainment show --date 2025-11-05
//! ```
//!
//! ## Architecture
//!
//! A run is a sequential pipeline over a single page session:
//! 1. **Indexing**: collect candidate article URLs from the listing page regions
//! 2. **Extraction**: JSON-LD metadata, body text and primary image per article
//! 3. **Admission**: provenance, headline, recency, near-duplicate, keyword and quota stages
//! 4. **Output**: replace the date's snapshot file

use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod fetcher;
mod filter;
mod models;
mod outputs;
mod pipeline;
mod review;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use config::Config;
use fetcher::Session;
use outputs::{json, markdown};
use pipeline::RunPlan;
use utils::{ensure_writable_dir, parse_utc_offset};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(output_dir = %args.output_dir, config = ?args.config, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref()).await?;
    let output_dir = PathBuf::from(&args.output_dir);

    match args.command {
        Command::Scrape {
            browserless_url,
            browserless_token,
            quota,
            cutoff,
        } => {
            if let Some(quota) = quota {
                config.admission.quota = quota;
            }
            if let Some(cutoff) = cutoff {
                config.admission.cutoff = cutoff;
            }
            let plan = RunPlan::from_config(&config)?;

            // Fail before touching the network if the snapshot cannot be written.
            if let Err(e) = ensure_writable_dir(&output_dir).await {
                error!(
                    path = %output_dir.display(),
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let mut session = match Session::launch(browserless_url.as_deref(), browserless_token.as_deref()) {
                Ok(session) => session,
                Err(e) => {
                    error!(error = %e, "Failed to open page session");
                    return Err(e.into());
                }
            };

            let now = plan.now();
            info!(date = %now.date_naive(), quota = plan.policy.quota(), "Starting daily scrape");
            let path = pipeline::scrape(&mut session, &plan, &output_dir, now).await?;
            info!(path = %path.display(), "Snapshot ready");
        }

        Command::Show { date, status } => {
            let date = match date {
                Some(date) => date,
                None => today(&config)?,
            };
            match json::load_snapshot(&output_dir, date).await? {
                Some(snapshot) => {
                    let ledger = review::load_ledger(&output_dir, date).await?;
                    print!("{}", markdown::render_digest(&snapshot, &ledger, status));
                }
                None => println!("No data for {date}"),
            }
        }

        Command::Recent { days } => {
            let snapshots = json::recent_snapshots(&output_dir, today(&config)?, days).await?;
            if snapshots.is_empty() {
                println!("No snapshots in the last {days} days");
            }
            for snapshot in snapshots {
                println!(
                    "{}\t{} articles\tgenerated {}",
                    snapshot.date,
                    snapshot.news_info.len(),
                    snapshot.generated_at
                );
            }
        }

        Command::Review { date, link, status } => {
            let Some(snapshot) = json::load_snapshot(&output_dir, date).await? else {
                warn!(%date, "No snapshot for date");
                return Err(format!("no snapshot for {date}").into());
            };
            let mut ledger = review::load_ledger(&output_dir, date).await?;
            let previous = ledger.transition(&snapshot, &link, status)?;
            review::save_ledger(&output_dir, &ledger).await?;
            println!("{link}: {previous} -> {status}");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Today's date in the configured target timezone.
fn today(config: &Config) -> Result<NaiveDate, Box<dyn Error>> {
    let offset = parse_utc_offset(&config.admission.utc_offset)
        .ok_or_else(|| format!("invalid utc_offset {:?}", config.admission.utc_offset))?;
    Ok(Utc::now().with_timezone(&offset).date_naive())
}
