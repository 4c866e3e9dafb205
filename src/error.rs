//! Error types for the artmerge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MergeError`] — **Fatal**: the run cannot proceed at all (missing base
//!   path, undecodable upload, zero valid records). Returned as
//!   `Err(MergeError)` from the top-level `process*` functions.
//!
//! * [`RowError`] — **Non-fatal**: a single input row failed to map but every
//!   other row is fine. The offending row is logged and skipped; the batch
//!   continues. One malformed row must never abort the whole export.
//!
//! Per-image fetch failures are not errors at either level: the fetch loop
//! records them as [`crate::output::FetchOutcome::Failed`] entries inside a
//! successful [`crate::output::BundleOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the artmerge library.
///
/// Row-level failures use [`RowError`] and are logged rather than propagated
/// here.
#[derive(Debug, Error)]
pub enum MergeError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No base storage path was configured. Checked before any parsing so
    /// no partial state is ever produced.
    #[error("No base path configured.\nSet the project folder path (e.g. --base-path '/Volumes/Drive/Appraisals/NY/BLAK202501') before processing.")]
    MissingBasePath,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Ingestion errors ──────────────────────────────────────────────────
    /// The uploaded bytes are not valid UTF-8 text.
    #[error("Input is not readable as UTF-8 text: {detail}\nRe-export the spreadsheet as CSV (UTF-8).")]
    InvalidEncoding { detail: String },

    /// The CSV parser rejected the input outright.
    #[error("Failed to parse the export: {detail}")]
    ParseFailed { detail: String },

    // ── Result errors ─────────────────────────────────────────────────────
    /// Every row was filtered out; there is nothing to serialize.
    #[error("No valid records found in {total} rows.\nCheck that the export has Artist and Title columns with values.")]
    NoValidRecords { total: usize },

    /// Re-serializing the cleaned records failed.
    #[error("Failed to serialize output table: {detail}")]
    SerializeFailed { detail: String },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// The zip builder refused an entry or failed to finalize.
    #[error("Failed to build image archive: {detail}")]
    ArchiveFailed { detail: String },

    /// Could not create or write an output artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input row.
///
/// The mapper returns this when a row cannot be processed; the caller logs it
/// with the row index and moves on. All other rows still make it into the
/// output.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RowError {
    /// Field resolution or derivation failed for this row.
    #[error("Row {row}: mapping failed: {detail}")]
    MappingFailed { row: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_valid_records_display() {
        let e = MergeError::NoValidRecords { total: 12 };
        let msg = e.to_string();
        assert!(msg.contains("12 rows"), "got: {msg}");
    }

    #[test]
    fn missing_base_path_mentions_flag() {
        let msg = MergeError::MissingBasePath.to_string();
        assert!(msg.contains("--base-path"));
    }

    #[test]
    fn row_error_display() {
        let e = RowError::MappingFailed {
            row: 7,
            detail: "bad images cell".into(),
        };
        assert!(e.to_string().contains("Row 7"));
        assert!(e.to_string().contains("bad images cell"));
    }

    #[test]
    fn invalid_encoding_hints_reexport() {
        let e = MergeError::InvalidEncoding {
            detail: "invalid utf-8 sequence".into(),
        };
        assert!(e.to_string().contains("UTF-8"));
    }
}
