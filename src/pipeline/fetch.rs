//! The image bundle: sequential fetch loop and zip assembly.
//!
//! ## Ordering and failure contract
//!
//! References are fetched strictly in input order, one in flight at a time,
//! and archive entries are inserted in that same order — the bundle a user
//! unpacks mirrors the table they exported. A failed fetch is recorded as a
//! [`FetchOutcome::Failed`] and the loop continues; only the zip writer
//! itself failing (a broken archive collaborator, not a broken network) is
//! fatal. There is no cancellation: once started, the loop attempts every
//! reference.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::fetcher::{HttpFetcher, ImageFetcher};
use crate::output::{BundleOutcome, FetchOutcome, ImageReference, ARCHIVE_FOLDER};
use crate::progress::Stage;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Fetch every reference and bundle the successes into a zip archive.
///
/// Always returns `Ok` once the loop starts — per-image failures are part of
/// the outcome, not errors. See [`BundleOutcome`].
pub async fn produce_bundle(
    refs: &[ImageReference],
    config: &MergeConfig,
) -> Result<BundleOutcome, MergeError> {
    let fetcher: Arc<dyn ImageFetcher> = match &config.fetcher {
        Some(f) => Arc::clone(f),
        None => Arc::new(HttpFetcher::new(config.download_timeout_secs)),
    };

    let total = refs.len();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut outcomes: Vec<FetchOutcome> = Vec::with_capacity(total);

    for (index, image) in refs.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_fetch_start(index + 1, total);
        }

        match fetcher.fetch(&image.url).await {
            Ok(bytes) => {
                let entry = format!("{ARCHIVE_FOLDER}/{}", image.file_name);
                zip.start_file(entry, options)
                    .map_err(|e| MergeError::ArchiveFailed {
                        detail: e.to_string(),
                    })?;
                zip.write_all(&bytes)
                    .map_err(|e| MergeError::ArchiveFailed {
                        detail: e.to_string(),
                    })?;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_fetch_complete(index + 1, total, bytes.len());
                }
                outcomes.push(FetchOutcome::Archived {
                    file_name: image.file_name.clone(),
                    bytes: bytes.len(),
                });
            }
            Err(e) => {
                warn!("Failed to download {}: {}", image.file_name, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_fetch_error(index + 1, total, &e.to_string());
                }
                outcomes.push(FetchOutcome::Failed {
                    file_name: image.file_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(Stage::Archiving);
    }

    let archive = zip
        .finish()
        .map_err(|e| MergeError::ArchiveFailed {
            detail: e.to_string(),
        })?
        .into_inner();

    let succeeded = outcomes.iter().filter(|o| o.is_archived()).count();
    let failed = total - succeeded;
    let status = bundle_status(succeeded, failed, &config.base_path);
    info!(
        "Image bundle complete: {}/{} fetched, {} bytes",
        succeeded,
        total,
        archive.len()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_bundle_complete(total, succeeded);
    }

    Ok(BundleOutcome {
        archive,
        succeeded,
        failed,
        outcomes,
        status,
    })
}

/// Closing status: the tally plus the extraction-path reminder users keep
/// needing.
fn bundle_status(succeeded: usize, failed: usize, base_path: &str) -> String {
    let mut status = format!("Downloads complete! Successfully downloaded {succeeded} images.");
    if failed > 0 {
        status.push_str(&format!(" Failed to download {failed} images."));
    }
    status.push_str(&format!(
        "\n\nIMPORTANT: Extract the zip file to: {base_path}"
    ));
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Serves one-byte bodies for every URL except those listed as failing.
    struct ScriptedFetcher {
        fail: HashSet<String>,
    }

    #[async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            if self.fail.contains(url) {
                Err(FetchError::Status { status: 500 })
            } else {
                Ok(url.as_bytes().to_vec())
            }
        }
    }

    fn refs(n: usize) -> Vec<ImageReference> {
        (0..n)
            .map(|i| ImageReference {
                url: format!("https://img/{i}.jpg"),
                file_name: format!("artist_title_{i}.jpg"),
                project_key: "P".into(),
            })
            .collect()
    }

    fn config_with(fail: &[&str]) -> MergeConfig {
        MergeConfig::builder()
            .base_path("/base")
            .fetcher(Arc::new(ScriptedFetcher {
                fail: fail.iter().map(|s| s.to_string()).collect(),
            }))
            .build()
            .unwrap()
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn bundles_all_when_every_fetch_succeeds() {
        let outcome = produce_bundle(&refs(3), &config_with(&[])).await.unwrap();
        assert_eq!(outcome.succeeded, 3);
        assert_eq!(outcome.failed, 0);
        assert_eq!(archive_names(&outcome.archive).len(), 3);
    }

    #[tokio::test]
    async fn one_failure_never_aborts_the_batch() {
        // Fail each index in turn; the rest must always survive.
        for k in 0..4 {
            let all = refs(4);
            let outcome = produce_bundle(&all, &config_with(&[all[k].url.as_str()]))
                .await
                .unwrap();
            assert_eq!(outcome.succeeded, 3, "failing index {k}");
            assert_eq!(outcome.failed, 1, "failing index {k}");
            let names = archive_names(&outcome.archive);
            assert_eq!(names.len(), 3);
            assert!(!names.iter().any(|n| n.ends_with(&all[k].file_name)));
        }
    }

    #[tokio::test]
    async fn entries_live_under_the_thumbs_folder_in_input_order() {
        let outcome = produce_bundle(&refs(2), &config_with(&[])).await.unwrap();
        let names = archive_names(&outcome.archive);
        assert_eq!(
            names,
            vec!["thumbs/artist_title_0.jpg", "thumbs/artist_title_1.jpg"]
        );
    }

    #[tokio::test]
    async fn outcomes_track_per_reference_results_in_order() {
        let all = refs(3);
        let outcome = produce_bundle(&all, &config_with(&[all[1].url.as_str()]))
            .await
            .unwrap();
        assert!(outcome.outcomes[0].is_archived());
        assert!(!outcome.outcomes[1].is_archived());
        assert!(outcome.outcomes[2].is_archived());
    }

    #[tokio::test]
    async fn empty_reference_list_yields_empty_archive() {
        let outcome = produce_bundle(&[], &config_with(&[])).await.unwrap();
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.failed, 0);
        assert!(archive_names(&outcome.archive).is_empty());
    }

    #[tokio::test]
    async fn status_reports_tally_and_extraction_path() {
        let all = refs(2);
        let outcome = produce_bundle(&all, &config_with(&[all[0].url.as_str()]))
            .await
            .unwrap();
        assert!(outcome.status.contains("1 images"));
        assert!(outcome.status.contains("Failed to download 1"));
        assert!(outcome.status.contains("/base"));
    }
}
