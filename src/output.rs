//! Output types: the canonical record, bookkeeping, stats, and artifacts.
//!
//! ## Display fields vs. bookkeeping
//!
//! Early revisions of this tool kept bookkeeping (raw image URLs, derived
//! file names, project keys) as underscore-prefixed columns on the same map
//! as the display fields and stripped them again before serialization. That
//! convention is one forgotten `remove()` away from leaking internal paths
//! into a client-facing CSV. Here the split is structural:
//! [`ArtworkRecord`] holds only what is serialized, [`MappedRow`] wraps it
//! together with bookkeeping that the serializer never sees.

use serde::{Deserialize, Serialize};

/// File name of the downloadable table artifact.
pub const OUTPUT_CSV_NAME: &str = "indesign-ready.csv";

/// MIME type of the table artifact.
pub const OUTPUT_CSV_MIME: &str = "text/csv";

/// Default file name of the image bundle artifact.
pub const BUNDLE_ARCHIVE_NAME: &str = "thumbs.zip";

/// Top-level folder inside the bundle; also the path segment records point
/// their `@imageFilePath` at.
pub const ARCHIVE_FOLDER: &str = "thumbs";

/// Project key used when neither the row nor the configuration names one.
pub const UNKNOWN_PROJECT: &str = "UNKNOWN_PROJECT";

/// One artwork in the fixed target schema.
///
/// Every field is a plain string; InDesign's data merge treats empty strings
/// as blank placeholders, so absence is represented by `""` rather than
/// `Option`. Only `artist` and `title` participate in the validity gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub artist: String,
    pub title: String,
    pub date: String,
    pub medium: String,
    pub dimensions: String,
    pub location: String,
    pub edition: String,
    /// `"{height} x {width}"`, composed from the two source measurement
    /// columns when both are present.
    pub alt_dimensions_1: String,
    /// Depth measurement, passed through as-is.
    pub alt_dimensions_2: String,
    pub signature: String,
    pub provenance: String,
    pub exhibitions: String,
    pub publications: String,
    pub condition: String,
    pub cataloguing: String,
    /// Full storage path of the record's (first) image, computed from the
    /// base path and the derived file name.
    pub image_file_path: String,
}

impl ArtworkRecord {
    /// Header row of the output table, in serialization order.
    pub const COLUMNS: [&'static str; 16] = [
        "Artist",
        "Title",
        "Date",
        "Medium",
        "Dimensions",
        "Location",
        "Edition",
        "Alt Dimensions 1 (h x w)",
        "Alt Dimensions 2 (h x w)",
        "Signature / Inscriptions / Labels",
        "Provenance",
        "Exhibitions",
        "Publications",
        "Condition",
        "Artwork Cataloguing",
        "@imageFilePath",
    ];

    /// Field values in [`Self::COLUMNS`] order.
    pub fn values(&self) -> [&str; 16] {
        [
            &self.artist,
            &self.title,
            &self.date,
            &self.medium,
            &self.dimensions,
            &self.location,
            &self.edition,
            &self.alt_dimensions_1,
            &self.alt_dimensions_2,
            &self.signature,
            &self.provenance,
            &self.exhibitions,
            &self.publications,
            &self.condition,
            &self.cataloguing,
            &self.image_file_path,
        ]
    }

    /// Mutable references in [`Self::COLUMNS`] order, for in-place cleaning.
    pub fn values_mut(&mut self) -> [&mut String; 16] {
        [
            &mut self.artist,
            &mut self.title,
            &mut self.date,
            &mut self.medium,
            &mut self.dimensions,
            &mut self.location,
            &mut self.edition,
            &mut self.alt_dimensions_1,
            &mut self.alt_dimensions_2,
            &mut self.signature,
            &mut self.provenance,
            &mut self.exhibitions,
            &mut self.publications,
            &mut self.condition,
            &mut self.cataloguing,
            &mut self.image_file_path,
        ]
    }
}

/// A mapped row: the serializable record plus internal bookkeeping.
///
/// Bookkeeping never reaches the Output Assembler's writer — it is consumed
/// by the Artifact Producer (image references) and the stats computation
/// (project key).
#[derive(Debug, Clone)]
pub struct MappedRow {
    pub record: ArtworkRecord,
    /// One reference per image URL extracted from the row, in match order.
    pub images: Vec<ImageReference>,
    /// Derived file name of the first image (`artist_title.jpg`), present
    /// even when the row yielded no URLs.
    pub file_name: String,
    /// Project grouping key: row field → configured code → `UNKNOWN_PROJECT`.
    pub project_key: String,
    /// Full storage path, duplicated from `record.image_file_path`.
    pub full_path: String,
}

/// A single image to fetch: where it lives and what the archive entry is
/// called. Consumed only by the bundle producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub url: String,
    pub file_name: String,
    pub project_key: String,
}

/// Summary of one processing run, recomputed fresh each invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Data rows seen by the parser (header excluded).
    pub total_rows: usize,
    /// Rows that passed the validity gate.
    pub valid_rows: usize,
    /// Image URLs extracted across all valid rows.
    pub images_found: usize,
    /// Distinct project keys among valid rows, in first-seen order.
    pub projects: Vec<String>,
}

/// Result of processing one uploaded export.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    /// The assembled table, ready to save as [`OUTPUT_CSV_NAME`].
    pub csv: String,
    /// Image references for the optional bundle step, in record order.
    pub images: Vec<ImageReference>,
    /// Run summary for display.
    pub stats: ProcessingStats,
}

/// What happened to one image reference during the fetch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Fetched and inserted into the archive.
    Archived { file_name: String, bytes: usize },
    /// Fetch failed; entry omitted, loop continued.
    Failed { file_name: String, reason: String },
}

impl FetchOutcome {
    pub fn is_archived(&self) -> bool {
        matches!(self, FetchOutcome::Archived { .. })
    }
}

/// Result of the image-bundle step: the finalized archive plus the tally.
///
/// A bundle with failures is still `Ok` — per-image errors degrade to counts,
/// they never abort the batch.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    /// Finalized zip bytes, ready to save as [`BUNDLE_ARCHIVE_NAME`].
    pub archive: Vec<u8>,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-reference outcomes, in input order.
    pub outcomes: Vec<FetchOutcome>,
    /// Human-readable closing status: tally plus the extraction-path
    /// reminder.
    pub status: String,
}
