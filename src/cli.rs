//! Command-line interface definitions.
//!
//! Endpoints for the render service can also come from the environment.

use crate::review::ReviewStatus;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Command-line arguments for the daily entertainment digest.
///
/// # Examples
///
/// ```sh
/// # Scrape today's articles with plain HTTP
/// daily_entertainment scrape
///
/// # Render through Browserless with a custom policy file
/// daily_entertainment -c config.yaml scrape --browserless-url http://localhost:3000
///
/// # Review
/// daily_entertainment show --date 2025-11-05 --status unprocessed
/// daily_entertainment review --date 2025-11-05 --link https://tw.news.yahoo.com/x.html --status selected-pic
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the per-date snapshot files
    #[arg(short, long, global = true, default_value = "docs/daily-entertainment")]
    pub output_dir: String,

    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape today's articles and write the snapshot
    Scrape {
        /// Browserless base URL; without it pages are fetched over plain HTTP
        #[arg(long, env = "BROWSERLESS_URL")]
        browserless_url: Option<String>,

        /// Browserless API token
        #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
        browserless_token: Option<String>,

        /// Override the maximum number of accepted articles
        #[arg(long)]
        quota: Option<usize>,

        /// Override the earliest accepted publish time, HH:MM
        #[arg(long)]
        cutoff: Option<String>,
    },

    /// Print the Markdown digest for a date
    Show {
        /// Snapshot date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Only articles in this review status
        #[arg(short, long, value_enum)]
        status: Option<ReviewStatus>,
    },

    /// List recent dates that have snapshots
    Recent {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Move an article to another review status
    Review {
        /// Snapshot date, YYYY-MM-DD
        #[arg(short, long)]
        date: NaiveDate,

        /// Article link as stored in the snapshot
        #[arg(short, long)]
        link: String,

        #[arg(short, long, value_enum)]
        status: ReviewStatus,
    },
}
