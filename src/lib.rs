//! # artmerge
//!
//! Prepare collections-management CSV exports for InDesign data merge.
//!
//! ## Why this crate?
//!
//! Collections systems (Airtable and friends) export artwork inventories as
//! loosely structured CSV: variant column names across revisions, cells full
//! of embedded line breaks, attachment columns that bury image URLs inside
//! parentheses, occasionally broken quoting. InDesign's data-merge feature
//! wants the opposite — a fixed column set, one line per record, a
//! deterministic image path per artwork. This crate is the bridge: it
//! normalizes each export into that fixed schema and optionally fetches the
//! referenced images into a zip laid out to match the generated paths.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV export
//!  │
//!  ├─ 1. Ingest    decode, repair known quote damage, parse, normalize cells
//!  ├─ 2. Map       alias-resolve fields, derive slugs/paths, extract image URLs
//!  ├─ 3. Assemble  re-clean display fields, serialize indesign-ready.csv
//!  └─ 4. Bundle    sequentially fetch images into thumbs.zip + tally
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use artmerge::{process, produce_image_bundle, MergeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MergeConfig::builder()
//!         .base_path("/Volumes/Drive/Appraisals/NY/BLAK202501")
//!         .project_code("BLAK202501")
//!         .build()?;
//!
//!     let text = std::fs::read_to_string("export.csv")?;
//!     let output = process(&text, &config)?;
//!     std::fs::write("indesign-ready.csv", &output.csv)?;
//!     eprintln!(
//!         "{}/{} rows valid, {} images",
//!         output.stats.valid_rows, output.stats.total_rows, output.stats.images_found
//!     );
//!
//!     let bundle = produce_image_bundle(&output.images, &config).await?;
//!     std::fs::write("thumbs.zip", &bundle.archive)?;
//!     eprintln!("{}", bundle.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `artmerge` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! artmerge = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    FieldAliases, ImageExtraction, MergeConfig, MergeConfigBuilder, QuoteMode, ValidityGate,
};
pub use error::{MergeError, RowError};
pub use fetcher::{FetchError, HttpFetcher, ImageFetcher};
pub use output::{
    ArtworkRecord, BundleOutcome, FetchOutcome, ImageReference, ProcessOutput, ProcessingStats,
    ARCHIVE_FOLDER, BUNDLE_ARCHIVE_NAME, OUTPUT_CSV_MIME, OUTPUT_CSV_NAME,
};
pub use process::{process, process_bytes, produce_image_bundle, save_artifact};
pub use progress::{MergeProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
