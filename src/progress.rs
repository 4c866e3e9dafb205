//! Progress-callback trait for pipeline stage and per-image fetch events.
//!
//! Inject an [`Arc<dyn MergeProgressCallback>`] via
//! [`crate::config::MergeConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline moves through its stages and, later, as
//! the bundle step fetches each image.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a status line, a progress bar, or a log — without the
//! library knowing anything about how the host application communicates. The
//! trait is `Send + Sync` so the same callback can be shared with the async
//! fetch loop.

use std::fmt;
use std::sync::Arc;

/// Pipeline stages, in execution order.
///
/// The `Display` impl renders a human-readable status string per stage
/// ("Reading file...", and so on; "Downloading image 3 of 12" is emitted
/// separately via the per-fetch events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Parsing,
    Mapping,
    Assembling,
    Archiving,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Reading => "Reading file...",
            Stage::Parsing => "Parsing CSV...",
            Stage::Mapping => "Processing rows...",
            Stage::Assembling => "Building output table...",
            Stage::Archiving => "Creating zip file...",
            Stage::Complete => "Ready! Download your files below.",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The fetch loop is strictly sequential, so per-fetch
/// events arrive in input order; implementations still must be `Send + Sync`
/// because the loop runs on the async runtime.
pub trait MergeProgressCallback: Send + Sync {
    /// Called when the pipeline enters a new stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called just before image `index` (1-indexed) of `total` is requested.
    fn on_fetch_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when an image was fetched and added to the archive.
    fn on_fetch_complete(&self, index: usize, total: usize, bytes: usize) {
        let _ = (index, total, bytes);
    }

    /// Called when a fetch failed; the loop continues with the next image.
    fn on_fetch_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every reference has been attempted and the archive
    /// is finalized.
    fn on_bundle_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl MergeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::MergeConfig`].
pub type ProgressCallback = Arc<dyn MergeProgressCallback>;
