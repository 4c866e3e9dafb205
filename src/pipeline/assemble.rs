//! Output assembly: from mapped rows to the downloadable table text.
//!
//! Only the fixed display columns are serialized — bookkeeping lives on
//! [`MappedRow`], a different type, so it cannot leak here. Every field gets
//! a final cleaning pass (line breaks and whitespace runs to one space,
//! trim, NFC) because alias resolution and alt-dimension composition can
//! reintroduce whitespace after ingestion already normalized the cells.
//!
//! Output is UTF-8 with no byte-order mark. InDesign reads BOM-less UTF-8
//! fine; a BOM corrupts the first header name in some template setups.

use crate::config::{MergeConfig, QuoteMode};
use crate::error::MergeError;
use crate::output::{ArtworkRecord, MappedRow};
use crate::pipeline::normalize::clean_field;

/// Serialize the valid records to CSV text.
///
/// Rows failing the configured validity gate are dropped here as well; the
/// mapper normally filters them first, but the assembler owns the final
/// guarantee that nothing invalid is serialized.
pub fn assemble(rows: &[MappedRow], config: &MergeConfig) -> Result<String, MergeError> {
    let quote_style = match config.quoting {
        QuoteMode::Minimal => csv::QuoteStyle::Necessary,
        QuoteMode::Always => csv::QuoteStyle::Always,
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(quote_style)
        .from_writer(Vec::new());

    writer
        .write_record(ArtworkRecord::COLUMNS)
        .map_err(|e| MergeError::SerializeFailed {
            detail: e.to_string(),
        })?;

    for row in rows {
        if !config
            .validity
            .admits(&row.record.artist, &row.record.title)
        {
            continue;
        }
        let mut record = row.record.clone();
        for field in record.values_mut() {
            *field = clean_field(field);
        }
        writer
            .write_record(record.values())
            .map_err(|e| MergeError::SerializeFailed {
                detail: e.to_string(),
            })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MergeError::SerializeFailed {
            detail: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| MergeError::SerializeFailed {
        detail: e.to_string(),
    })
}
