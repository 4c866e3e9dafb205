//! Top-level entry points: one call per uploaded export.
//!
//! ## Shape of a run
//!
//! Parsing, mapping, and assembly are synchronous — an export of a few
//! thousand rows transforms in milliseconds and there is nothing to await.
//! Only the optional image-bundle step is async, because it spends its life
//! waiting on the network. The two artifacts share the mapper's output:
//!
//! ```text
//! process()  ──▶ ProcessOutput { csv, images, stats }
//!                         │
//! produce_image_bundle(&output.images, …) ──▶ BundleOutcome
//! ```
//!
//! Nothing survives a run: every invocation rebuilds all state from the
//! input it is handed.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::output::{BundleOutcome, ImageReference, ProcessOutput, ProcessingStats};
use crate::pipeline::{assemble, fetch, ingest, mapper};
use crate::progress::Stage;
use std::path::Path;
use tracing::{debug, info, warn};

/// Process an uploaded export's raw bytes.
///
/// The configuration is validated first — a missing base path blocks the run
/// before any parsing — then the bytes are decoded as UTF-8 and handed to
/// [`process`].
pub fn process_bytes(bytes: &[u8], config: &MergeConfig) -> Result<ProcessOutput, MergeError> {
    ensure_base_path(config)?;
    emit(config, Stage::Reading);
    let text = std::str::from_utf8(bytes).map_err(|e| MergeError::InvalidEncoding {
        detail: e.to_string(),
    })?;
    run(text, config)
}

/// Process already-decoded export text.
///
/// # Errors
/// Fatal errors only: missing base path, undecodable/unparseable input, or
/// zero valid records. Per-row mapping problems are logged and skipped.
pub fn process(text: &str, config: &MergeConfig) -> Result<ProcessOutput, MergeError> {
    ensure_base_path(config)?;
    run(text, config)
}

fn run(text: &str, config: &MergeConfig) -> Result<ProcessOutput, MergeError> {
    info!("Processing export ({} bytes)", text.len());

    // ── Step 1: Parse ────────────────────────────────────────────────────
    emit(config, Stage::Parsing);
    let table = ingest::ingest(text, config)?;
    let total_rows = table.rows.len();
    debug!(
        "Parsed {} rows, headers: {:?}",
        total_rows,
        table.headers
    );

    // ── Step 2: Map rows ─────────────────────────────────────────────────
    emit(config, Stage::Mapping);
    let mut mapped = Vec::with_capacity(total_rows);
    for (index, row) in table.rows.iter().enumerate() {
        match mapper::map_row(row, index, config) {
            Ok(Some(m)) => mapped.push(m),
            Ok(None) => {}
            Err(e) => warn!("Skipping row: {}", e),
        }
    }

    if mapped.is_empty() {
        return Err(MergeError::NoValidRecords { total: total_rows });
    }

    // ── Step 3: Assemble the table ───────────────────────────────────────
    emit(config, Stage::Assembling);
    let csv = assemble::assemble(&mapped, config)?;

    // ── Step 4: Collect references and stats ─────────────────────────────
    let images: Vec<ImageReference> = mapped.iter().flat_map(|m| m.images.clone()).collect();

    let mut projects: Vec<String> = Vec::new();
    for m in &mapped {
        if !projects.contains(&m.project_key) {
            projects.push(m.project_key.clone());
        }
    }

    let stats = ProcessingStats {
        total_rows,
        valid_rows: mapped.len(),
        images_found: images.len(),
        projects,
    };

    emit(config, Stage::Complete);
    info!(
        "Processing complete: {}/{} rows valid, {} images",
        stats.valid_rows, stats.total_rows, stats.images_found
    );

    Ok(ProcessOutput { csv, images, stats })
}

/// Fetch the referenced images and bundle the successes into a zip.
///
/// See [`crate::pipeline::fetch::produce_bundle`] for the ordering and
/// failure contract.
pub async fn produce_image_bundle(
    refs: &[ImageReference],
    config: &MergeConfig,
) -> Result<BundleOutcome, MergeError> {
    fetch::produce_bundle(refs, config).await
}

/// Write an artifact to disk atomically (temp file + rename) so a crash
/// mid-write never leaves a truncated CSV or zip behind.
pub async fn save_artifact(bytes: &[u8], path: impl AsRef<Path>) -> Result<(), MergeError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MergeError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| MergeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| MergeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn ensure_base_path(config: &MergeConfig) -> Result<(), MergeError> {
    if config.base_path.trim().is_empty() {
        return Err(MergeError::MissingBasePath);
    }
    Ok(())
}

fn emit(config: &MergeConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;

    fn config() -> MergeConfig {
        MergeConfig::builder().base_path("/base").build().unwrap()
    }

    const EXPORT: &str = "\
Artist (from Artwork),Title (from Artwork),Images (from Artwork)\n\
Manet,Olympia,img.jpg (https://img/1.jpg)\n\
,Orphan Title,\n\
Degas,Dancer,\n";

    #[test]
    fn missing_base_path_blocks_before_parsing() {
        let config = MergeConfig {
            base_path: "  ".into(),
            ..MergeConfig::default()
        };
        let err = process("Artist,Title\n", &config).unwrap_err();
        assert!(matches!(err, MergeError::MissingBasePath));
    }

    #[test]
    fn undecodable_bytes_are_fatal() {
        let err = process_bytes(&[0x41, 0xFF, 0xFE], &config()).unwrap_err();
        assert!(matches!(err, MergeError::InvalidEncoding { .. }));
    }

    #[test]
    fn empty_result_is_a_distinct_error() {
        let err = process(
            "Artist (from Artwork),Title (from Artwork)\n,OnlyTitle\nOnlyArtist,\n",
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::NoValidRecords { total: 2 }));
    }

    #[test]
    fn counts_rows_images_and_projects() {
        let output = process(EXPORT, &config()).unwrap();
        assert_eq!(output.stats.total_rows, 3);
        assert_eq!(output.stats.valid_rows, 2);
        assert_eq!(output.stats.images_found, 1);
        assert_eq!(output.stats.projects, vec!["UNKNOWN_PROJECT"]);
        assert_eq!(output.images.len(), 1);
        assert_eq!(output.images[0].url, "https://img/1.jpg");
    }

    #[test]
    fn output_table_has_one_row_per_valid_record() {
        let output = process(EXPORT, &config()).unwrap();
        // Header + 2 data rows.
        assert_eq!(output.csv.lines().count(), 3);
        assert!(output.csv.contains("Manet"));
        assert!(output.csv.contains("Degas"));
        assert!(!output.csv.contains("Orphan Title"));
    }

    #[test]
    fn projects_are_distinct_in_first_seen_order() {
        let text = "\
Artist (from Artwork),Title (from Artwork),Project ID #\n\
A,T,P2\n\
B,U,P1\n\
C,V,P2\n";
        let output = process(text, &config()).unwrap();
        assert_eq!(output.stats.projects, vec!["P2", "P1"]);
    }

    #[tokio::test]
    async fn save_artifact_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/indesign-ready.csv");
        save_artifact(b"Artist,Title\n", &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"Artist,Title\n");
        assert!(!path.with_extension("tmp").exists());
    }
}
