//! Configuration types for the CSV-to-data-merge pipeline.
//!
//! All processing behaviour is controlled through [`MergeConfig`], built via
//! its [`MergeConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across runs, serialise the variant flags for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! # Design choice: variants as configuration, not branches
//! The source exports this tool ingests have drifted across revisions —
//! column names, validity gates, path layouts, and quoting behaviour all
//! vary. Each drift point is an explicit field here ([`FieldAliases`],
//! [`ValidityGate`], [`MergeConfig::project_folders`], [`QuoteMode`],
//! [`ImageExtraction`]) rather than a hard-coded per-revision code path.

use crate::error::MergeError;
use crate::fetcher::ImageFetcher;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one processing run.
///
/// Built via [`MergeConfig::builder()`]. `base_path` is the only required
/// field; everything else has a default matching the most recent source
/// revision.
///
/// # Example
/// ```rust
/// use artmerge::MergeConfig;
///
/// let config = MergeConfig::builder()
///     .base_path("/Volumes/Drive/Appraisals/NY/BLAK202501")
///     .project_code("BLAK202501")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct MergeConfig {
    /// Base storage path every `@imageFilePath` is rooted at. Required —
    /// processing refuses to start without it.
    pub base_path: String,

    /// Fallback project key when a row has no project field of its own.
    pub project_code: Option<String>,

    /// Canonical field → ordered source-column aliases. The variability
    /// point across input schemas; replace wholesale or tweak one list.
    pub aliases: FieldAliases,

    /// Insert a `{project_key}/` segment between the base path and the
    /// `thumbs/` folder. Default: false (the flat layout).
    pub project_folders: bool,

    /// Which rows count as valid. Default: [`ValidityGate::RequireBoth`].
    pub validity: ValidityGate,

    /// Output quoting behaviour. Default: [`QuoteMode::Minimal`].
    pub quoting: QuoteMode,

    /// Single- vs multi-URL image extraction. Default:
    /// [`ImageExtraction::AllMatches`].
    pub extraction: ImageExtraction,

    /// Run the narrow doubled-quote repair pre-pass before parsing.
    /// Default: true.
    ///
    /// The pre-pass rewrites fields *wholly* wrapped in doubled quotes
    /// (`,""Untitled (nude)"",`) to singly-quoted form. Some exports produce
    /// this around titles containing parentheses and the parser would
    /// otherwise split them mid-field. It is a documented, narrow patch —
    /// not general quote repair.
    pub repair_quotes: bool,

    /// Per-image download timeout in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Network collaborator for the bundle step. When `None`, a
    /// reqwest-backed [`crate::fetcher::HttpFetcher`] is constructed on
    /// demand. Inject a custom implementation in tests or to add caching.
    pub fetcher: Option<Arc<dyn ImageFetcher>>,

    /// Observer for stage and per-image progress events. `None` = silent.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            project_code: None,
            aliases: FieldAliases::default(),
            project_folders: false,
            validity: ValidityGate::default(),
            quoting: QuoteMode::default(),
            extraction: ImageExtraction::default(),
            repair_quotes: true,
            download_timeout_secs: 60,
            fetcher: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("base_path", &self.base_path)
            .field("project_code", &self.project_code)
            .field("project_folders", &self.project_folders)
            .field("validity", &self.validity)
            .field("quoting", &self.quoting)
            .field("extraction", &self.extraction)
            .field("repair_quotes", &self.repair_quotes)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn ImageFetcher>"))
            .finish()
    }
}

impl MergeConfig {
    /// Create a new builder for `MergeConfig`.
    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MergeConfig`].
#[derive(Debug)]
pub struct MergeConfigBuilder {
    config: MergeConfig,
}

impl MergeConfigBuilder {
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = path.into();
        self
    }

    pub fn project_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.config.project_code = if code.is_empty() { None } else { Some(code) };
        self
    }

    pub fn aliases(mut self, aliases: FieldAliases) -> Self {
        self.config.aliases = aliases;
        self
    }

    pub fn project_folders(mut self, v: bool) -> Self {
        self.config.project_folders = v;
        self
    }

    pub fn validity(mut self, gate: ValidityGate) -> Self {
        self.config.validity = gate;
        self
    }

    pub fn quoting(mut self, mode: QuoteMode) -> Self {
        self.config.quoting = mode;
        self
    }

    pub fn extraction(mut self, mode: ImageExtraction) -> Self {
        self.config.extraction = mode;
        self
    }

    pub fn repair_quotes(mut self, v: bool) -> Self {
        self.config.repair_quotes = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MergeConfig, MergeError> {
        let c = &self.config;
        if c.base_path.trim().is_empty() {
            return Err(MergeError::MissingBasePath);
        }
        if c.aliases.artist.is_empty() || c.aliases.title.is_empty() {
            return Err(MergeError::InvalidConfig(
                "Alias lists for Artist and Title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Alias table ──────────────────────────────────────────────────────────

/// Ordered source-column aliases per canonical field.
///
/// Resolution tries each alias in order and takes the first column with a
/// non-empty value; no match resolves to the empty string. The default table
/// covers the Airtable `"X (from Artwork)"` export schema with bare-name
/// fallbacks for older exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub artist: Vec<String>,
    pub title: Vec<String>,
    pub date: Vec<String>,
    pub medium: Vec<String>,
    pub dimensions: Vec<String>,
    pub location: Vec<String>,
    pub edition: Vec<String>,
    /// Source column for the height half of Alt Dimensions 1.
    pub height: Vec<String>,
    /// Source column for the width half of Alt Dimensions 1.
    pub width: Vec<String>,
    /// Source column for Alt Dimensions 2.
    pub depth: Vec<String>,
    pub signature: Vec<String>,
    pub provenance: Vec<String>,
    pub exhibitions: Vec<String>,
    pub publications: Vec<String>,
    pub condition: Vec<String>,
    pub cataloguing: Vec<String>,
    /// Attachment-style column the image URLs are extracted from.
    pub images: Vec<String>,
    /// Row-level project key column.
    pub project: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            artist: names(&["Artist (from Artwork)", "Artist"]),
            title: names(&["Title (from Artwork)", "Name", "Title"]),
            date: names(&["Date (from Artwork)", "Date"]),
            medium: names(&["Medium (from Artwork)", "Medium"]),
            dimensions: names(&["Dimensions (from Artwork)", "Dimensions"]),
            location: names(&["Location"]),
            edition: names(&["Edition (from Artwork)", "Edition"]),
            height: names(&["Height In. (from Artwork)", "Height In."]),
            width: names(&["Width In. (from Artwork)", "Width In."]),
            depth: names(&["Depth In. (from Artwork)", "Depth In."]),
            signature: names(&[
                "Signature & Inscription (from Artwork)",
                "Signature / Inscriptions / Labels",
            ]),
            provenance: names(&["Provenance (from Artwork)", "Provenance"]),
            exhibitions: names(&["Exhibitions (from Artwork)", "Exhibitions"]),
            publications: names(&["Publications (from Artwork)", "Publications"]),
            condition: names(&["Condition (from Artwork)", "Condition"]),
            cataloguing: names(&["Object ID#", "Object ID #", "Artwork Cataloguing"]),
            images: names(&["Images (from Artwork)", "Images", "Attachments"]),
            project: names(&["Project ID #", "Project ID#", "Project"]),
        }
    }
}

// ── Variant enums ────────────────────────────────────────────────────────

/// Which rows survive the validity gate.
///
/// The strict gate is the default; `RequireEither` reproduces the looser
/// behaviour of older revisions for callers that still depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidityGate {
    /// Artist AND Title must be non-empty. (default)
    #[default]
    RequireBoth,
    /// Artist OR Title non-empty is enough. Legacy mode.
    RequireEither,
}

impl ValidityGate {
    /// Apply the gate to a row's resolved Artist and Title.
    pub fn admits(&self, artist: &str, title: &str) -> bool {
        match self {
            ValidityGate::RequireBoth => !artist.is_empty() && !title.is_empty(),
            ValidityGate::RequireEither => !artist.is_empty() || !title.is_empty(),
        }
    }
}

/// Output quoting behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuoteMode {
    /// Quote only fields that need it. (default)
    #[default]
    Minimal,
    /// Quote every field, `"` as both quote and escape. Some layout
    /// templates only accept this form.
    Always,
}

/// How many image URLs to extract per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageExtraction {
    /// Every parenthesised URL in the images field, left to right. (default)
    #[default]
    AllMatches,
    /// First match only. Legacy single-image behaviour.
    FirstOnly,
}
