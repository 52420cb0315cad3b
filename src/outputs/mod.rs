//! Output generation and the snapshot read interface.
//!
//! # Submodules
//!
//! - [`json`]: writes and reads the per-date snapshot files the dashboard consumes
//! - [`markdown`]: renders a snapshot as a Markdown digest for review
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-11-05.json        # Snapshot
//! └── review/
//!     └── 2025-11-05.json    # Review statuses
//! ```

pub mod json;
pub mod markdown;
