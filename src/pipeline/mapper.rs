//! Record mapping: from a raw parsed row to a canonical artwork record.
//!
//! This is the stage with the real decisions in it:
//!
//! 1. **Field resolution** through the configured alias table — first
//!    non-empty source column wins.
//! 2. **Slug and path derivation** — a pure function of the resolved Artist
//!    and Title plus the configured base path, so re-running an export
//!    always lands images at the same paths.
//! 3. **Image extraction** — every `(https://…)` substring in the
//!    attachment cell, in order, or just the first in legacy mode.
//! 4. **Validity gate** — invalid rows map to `None`, never to an error.
//!
//! A `RowError` from this module means the row itself was unusable; the
//! caller logs it and moves on. One malformed row never aborts the batch.

use crate::config::{ImageExtraction, MergeConfig};
use crate::error::RowError;
use crate::output::{ArtworkRecord, ImageReference, MappedRow, ARCHIVE_FOLDER, UNKNOWN_PROJECT};
use crate::pipeline::ingest::RawRow;
use crate::pipeline::normalize::slug;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A URL wrapped in parentheses, the shape attachment-style export columns
/// use: `name.jpg (https://host/path)`.
static RE_PAREN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((https?://[^)]+)\)").unwrap());

/// Map one raw row into a [`MappedRow`].
///
/// Returns `Ok(None)` when the row fails the validity gate, `Err` when the
/// row is malformed beyond use. `row_index` is 0-based and only used for
/// diagnostics.
pub fn map_row(
    row: &RawRow,
    row_index: usize,
    config: &MergeConfig,
) -> Result<Option<MappedRow>, RowError> {
    let aliases = &config.aliases;

    let artist = resolve(&aliases.artist, row);
    let title = resolve(&aliases.title, row);

    if !config.validity.admits(&artist, &title) {
        debug!(
            "Row {}: dropped by validity gate (artist {:?}, title {:?})",
            row_index + 1,
            artist,
            title
        );
        return Ok(None);
    }

    // ── Slug / path derivation ───────────────────────────────────────────
    let file_stem = format!("{}_{}", slug(&artist), slug(&title));
    let mut project_key = resolve(&aliases.project, row);
    if project_key.is_empty() {
        project_key = config
            .project_code
            .clone()
            .unwrap_or_else(|| UNKNOWN_PROJECT.to_string());
    }

    let file_name = image_file_name(&file_stem, 0);
    let full_path = storage_path(config, &project_key, &file_name);

    // ── Image extraction ─────────────────────────────────────────────────
    let images_cell = resolve(&aliases.images, row);
    let urls = extract_urls(&images_cell, config.extraction, row_index)?;
    let images: Vec<ImageReference> = urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| ImageReference {
            url,
            file_name: image_file_name(&file_stem, i),
            project_key: project_key.clone(),
        })
        .collect();

    // ── Canonical record ─────────────────────────────────────────────────
    let height = resolve(&aliases.height, row);
    let width = resolve(&aliases.width, row);
    let alt_dimensions_1 = if !height.is_empty() && !width.is_empty() {
        format!("{} x {}", height, width)
    } else {
        String::new()
    };

    let record = ArtworkRecord {
        artist,
        title,
        date: resolve(&aliases.date, row),
        medium: resolve(&aliases.medium, row),
        dimensions: resolve(&aliases.dimensions, row),
        location: resolve(&aliases.location, row),
        edition: resolve(&aliases.edition, row),
        alt_dimensions_1,
        alt_dimensions_2: resolve(&aliases.depth, row),
        signature: resolve(&aliases.signature, row),
        provenance: resolve(&aliases.provenance, row),
        exhibitions: resolve(&aliases.exhibitions, row),
        publications: resolve(&aliases.publications, row),
        condition: resolve(&aliases.condition, row),
        cataloguing: resolve(&aliases.cataloguing, row),
        image_file_path: full_path.clone(),
    };

    Ok(Some(MappedRow {
        record,
        images,
        file_name,
        project_key,
        full_path,
    }))
}

/// First non-empty value among the aliased source columns.
fn resolve(aliases: &[String], row: &RawRow) -> String {
    for alias in aliases {
        if let Some(value) = row.get(alias) {
            if !value.is_empty() {
                return value.clone();
            }
        }
    }
    String::new()
}

/// `stem.jpg` for the first image, `stem_2.jpg`, `stem_3.jpg`, … after.
fn image_file_name(stem: &str, index: usize) -> String {
    if index == 0 {
        format!("{stem}.jpg")
    } else {
        format!("{stem}_{}.jpg", index + 1)
    }
}

/// `{base}/[{project}/]thumbs/{file}`, trailing slash on the base tolerated.
fn storage_path(config: &MergeConfig, project_key: &str, file_name: &str) -> String {
    let base = config.base_path.trim_end_matches('/');
    if config.project_folders {
        format!("{base}/{project_key}/{ARCHIVE_FOLDER}/{file_name}")
    } else {
        format!("{base}/{ARCHIVE_FOLDER}/{file_name}")
    }
}

/// Pull every parenthesised URL out of the attachment cell.
///
/// Zero matches is fine — the record just contributes no image references.
/// A URL with control characters means the cell itself is mangled (usually a
/// truncated export); that is the one condition worth failing the row over.
fn extract_urls(
    cell: &str,
    mode: ImageExtraction,
    row_index: usize,
) -> Result<Vec<String>, RowError> {
    let mut urls = Vec::new();
    for caps in RE_PAREN_URL.captures_iter(cell) {
        let url = caps[1].to_string();
        if url.chars().any(|c| c.is_control()) {
            return Err(RowError::MappingFailed {
                row: row_index + 1,
                detail: format!("malformed image URL in attachment cell: {url:?}"),
            });
        }
        urls.push(url);
        if mode == ImageExtraction::FirstOnly {
            break;
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldAliases, ValidityGate};

    fn config() -> MergeConfig {
        MergeConfig::builder().base_path("/base").build().unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn map(pairs: &[(&str, &str)], config: &MergeConfig) -> Option<MappedRow> {
        map_row(&row(pairs), 0, config).unwrap()
    }

    #[test]
    fn resolves_airtable_columns() {
        let mapped = map(
            &[
                ("Artist (from Artwork)", "Manet"),
                ("Title (from Artwork)", "Olympia"),
                ("Medium (from Artwork)", "oil on canvas"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.record.artist, "Manet");
        assert_eq!(mapped.record.medium, "oil on canvas");
    }

    #[test]
    fn alias_fallback_first_non_empty_wins() {
        // Primary alias present but empty: falls through to "Name".
        let mapped = map(
            &[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", ""),
                ("Name", "Fallback Title"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.record.title, "Fallback Title");
    }

    #[test]
    fn strict_gate_drops_partial_rows() {
        assert!(map(&[("Artist (from Artwork)", "X")], &config()).is_none());
        assert!(map(&[("Title (from Artwork)", "Y")], &config()).is_none());
        assert!(map(
            &[("Artist (from Artwork)", "X"), ("Title (from Artwork)", "Y")],
            &config()
        )
        .is_some());
    }

    #[test]
    fn loose_gate_admits_partial_rows() {
        let config = MergeConfig::builder()
            .base_path("/base")
            .validity(ValidityGate::RequireEither)
            .build()
            .unwrap();
        assert!(map(&[("Artist (from Artwork)", "X")], &config).is_some());
    }

    #[test]
    fn derives_file_name_and_flat_path() {
        let mapped = map(
            &[
                ("Artist (from Artwork)", "Édouard Manet"),
                ("Title (from Artwork)", "Le Déjeuner sur l'herbe"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.file_name, "Edouard-Manet_Le-Dejeuner-sur-l-herbe.jpg");
        assert_eq!(
            mapped.full_path,
            "/base/thumbs/Edouard-Manet_Le-Dejeuner-sur-l-herbe.jpg"
        );
        assert_eq!(mapped.record.image_file_path, mapped.full_path);
    }

    #[test]
    fn project_folder_layout_inserts_segment() {
        let config = MergeConfig::builder()
            .base_path("/base/")
            .project_code("KOZL202501")
            .project_folders(true)
            .build()
            .unwrap();
        let mapped = map(
            &[("Artist (from Artwork)", "A"), ("Title (from Artwork)", "T")],
            &config,
        )
        .unwrap();
        assert_eq!(mapped.full_path, "/base/KOZL202501/thumbs/A_T.jpg");
    }

    #[test]
    fn project_key_fallback_chain() {
        // Row field beats configured code.
        let cfg = MergeConfig::builder()
            .base_path("/b")
            .project_code("CONF")
            .build()
            .unwrap();
        let mapped = map(
            &[
                ("Artist (from Artwork)", "A"),
                ("Title (from Artwork)", "T"),
                ("Project ID #", "ROW1"),
            ],
            &cfg,
        )
        .unwrap();
        assert_eq!(mapped.project_key, "ROW1");

        // No row field: configured code.
        let mapped = map(
            &[("Artist (from Artwork)", "A"), ("Title (from Artwork)", "T")],
            &cfg,
        )
        .unwrap();
        assert_eq!(mapped.project_key, "CONF");

        // Neither: the literal fallback.
        let mapped = map(
            &[("Artist (from Artwork)", "A"), ("Title (from Artwork)", "T")],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.project_key, UNKNOWN_PROJECT);
    }

    #[test]
    fn extracts_all_urls_in_order_with_suffixes() {
        let mapped = map(
            &[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", "Y"),
                (
                    "Images (from Artwork)",
                    "a.jpg (https://a/1.jpg)(https://b/2.jpg), b.jpg (https://c/3.jpg)",
                ),
            ],
            &config(),
        )
        .unwrap();
        let urls: Vec<&str> = mapped.images.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a/1.jpg", "https://b/2.jpg", "https://c/3.jpg"]);
        let names: Vec<&str> = mapped.images.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["X_Y.jpg", "X_Y_2.jpg", "X_Y_3.jpg"]);
    }

    #[test]
    fn legacy_mode_takes_first_url_only() {
        let config = MergeConfig::builder()
            .base_path("/b")
            .extraction(ImageExtraction::FirstOnly)
            .build()
            .unwrap();
        let mapped = map(
            &[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", "Y"),
                ("Images (from Artwork)", "(https://a/1.jpg)(https://b/2.jpg)"),
            ],
            &config,
        )
        .unwrap();
        assert_eq!(mapped.images.len(), 1);
        assert_eq!(mapped.images[0].url, "https://a/1.jpg");
    }

    #[test]
    fn no_images_is_still_a_valid_record() {
        let mapped = map(
            &[("Artist (from Artwork)", "X"), ("Title (from Artwork)", "Y")],
            &config(),
        )
        .unwrap();
        assert!(mapped.images.is_empty());
        // The path field is still derived.
        assert_eq!(mapped.record.image_file_path, "/base/thumbs/X_Y.jpg");
    }

    #[test]
    fn control_characters_in_url_fail_the_row() {
        let err = map_row(
            &row(&[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", "Y"),
                ("Images (from Artwork)", "(https://a/\u{0007}bad.jpg)"),
            ]),
            4,
            &config(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Row 5"));
    }

    #[test]
    fn composes_alt_dimensions() {
        let mapped = map(
            &[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", "Y"),
                ("Height In. (from Artwork)", "24"),
                ("Width In. (from Artwork)", "36"),
                ("Depth In. (from Artwork)", "2"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.record.alt_dimensions_1, "24 x 36");
        assert_eq!(mapped.record.alt_dimensions_2, "2");
    }

    #[test]
    fn alt_dimensions_need_both_height_and_width() {
        let mapped = map(
            &[
                ("Artist (from Artwork)", "X"),
                ("Title (from Artwork)", "Y"),
                ("Height In. (from Artwork)", "24"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(mapped.record.alt_dimensions_1, "");
    }

    #[test]
    fn custom_alias_table_is_honoured() {
        let mut aliases = FieldAliases::default();
        aliases.artist = vec!["Maker".to_string()];
        let config = MergeConfig::builder()
            .base_path("/b")
            .aliases(aliases)
            .build()
            .unwrap();
        let mapped = map(&[("Maker", "A"), ("Title (from Artwork)", "T")], &config).unwrap();
        assert_eq!(mapped.record.artist, "A");
    }
}
