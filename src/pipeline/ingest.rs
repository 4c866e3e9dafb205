//! Table ingestion: decode, repair, parse, normalize.
//!
//! ## Why a repair pre-pass?
//!
//! One recurring export defect wraps whole fields in doubled quotes —
//! `,""Untitled (nude)"",` — which a conforming CSV parser reads as an empty
//! field followed by garbage. The pre-pass rewrites only that shape (a field
//! *wholly* wrapped in doubled quotes, no interior quotes) back to a single
//! pair before parsing. It is deliberately narrow; general quote repair is a
//! rabbit hole and the parser's own error recovery covers the rest.
//!
//! Headers are trimmed and *merged*: exports sometimes repeat a column name,
//! and for a duplicated name the first non-empty cell wins. Rows shorter
//! than the header row pad with empty values; rows with extra cells drop
//! them.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::pipeline::normalize::normalize_cell;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One parsed row: merged header name → normalized cell value. Ephemeral —
/// consumed by the mapper and dropped.
pub type RawRow = HashMap<String, String>;

/// The ingested table: headers in input order plus the data rows.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Parse decoded text into a [`ParsedTable`].
///
/// Never fails on malformed quoting in the common case — malformed records
/// are logged and skipped, short rows pad with empty values. Decoding the
/// upload's bytes (the one fatal ingestion failure) happens in
/// [`crate::process::process_bytes`] before this is called.
pub fn ingest(text: &str, config: &MergeConfig) -> Result<ParsedTable, MergeError> {
    // Spreadsheet tools love to prepend a BOM to "UTF-8" CSV.
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    let repaired;
    let text = if config.repair_quotes {
        repaired = repair_doubled_quotes(text);
        repaired.as_str()
    } else {
        text
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| MergeError::ParseFailed {
            detail: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unparseable record {}: {}", index + 1, e);
                continue;
            }
        };

        let mut row = RawRow::with_capacity(headers.len());
        let mut any_value = false;
        for (i, header) in headers.iter().enumerate() {
            let value = normalize_cell(record.get(i).unwrap_or(""));
            any_value |= !value.is_empty();
            // First non-empty value wins for duplicated header names.
            let slot = row.entry(header.clone()).or_default();
            if slot.is_empty() && !value.is_empty() {
                *slot = value;
            }
        }

        // skipEmptyLines-style greediness: a row of empty cells is noise.
        if any_value {
            rows.push(row);
        } else {
            debug!("Skipping blank row {}", index + 1);
        }
    }

    Ok(ParsedTable { headers, rows })
}

// ── Quote repair ─────────────────────────────────────────────────────────

/// A field wholly wrapped in doubled quotes, bounded by commas or line
/// edges. The body admits no quote characters, which is what keeps the
/// rewrite narrow.
static RE_DOUBLED_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?P<pre>^|,)""(?P<body>[^"\r\n]+)""(?P<post>,|$)"#).unwrap()
});

/// Rewrite `,""…"",` fields to `,"…",`.
///
/// Two passes: adjacent broken fields share a comma, and a regex match
/// consumes it, hiding the second field from the first pass.
fn repair_doubled_quotes(text: &str) -> String {
    let once = RE_DOUBLED_FIELD
        .replace_all(text, "${pre}\"${body}\"${post}")
        .into_owned();
    RE_DOUBLED_FIELD
        .replace_all(&once, "${pre}\"${body}\"${post}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MergeConfig {
        MergeConfig::builder().base_path("/p").build().unwrap()
    }

    #[test]
    fn parses_headers_and_rows() {
        let table = ingest("A,B\n1,2\n3,4\n", &config()).unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["A"], "1");
        assert_eq!(table.rows[1]["B"], "4");
    }

    #[test]
    fn trims_header_whitespace() {
        let table = ingest(" Artist , Title \nx,y\n", &config()).unwrap();
        assert_eq!(table.headers, vec!["Artist", "Title"]);
        assert_eq!(table.rows[0]["Artist"], "x");
    }

    #[test]
    fn collapses_embedded_line_breaks_in_cells() {
        let table = ingest("A,B\n\"oil on\ncanvas\",z\n", &config()).unwrap();
        assert_eq!(table.rows[0]["A"], "oil on canvas");
    }

    #[test]
    fn short_rows_pad_with_empty_values() {
        let table = ingest("A,B,C\nonly\n", &config()).unwrap();
        assert_eq!(table.rows[0]["A"], "only");
        assert_eq!(table.rows[0]["B"], "");
        assert_eq!(table.rows[0]["C"], "");
    }

    #[test]
    fn blank_rows_are_skipped_greedily() {
        let table = ingest("A,B\n,\n\"\",\n1,2\n", &config()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["A"], "1");
    }

    #[test]
    fn duplicate_headers_merge_first_non_empty_wins() {
        let table = ingest("Title,Title\n,second\n", &config()).unwrap();
        assert_eq!(table.rows[0]["Title"], "second");

        let table = ingest("Title,Title\nfirst,second\n", &config()).unwrap();
        assert_eq!(table.rows[0]["Title"], "first");
    }

    #[test]
    fn strips_leading_bom() {
        let table = ingest("\u{FEFF}A,B\n1,2\n", &config()).unwrap();
        assert_eq!(table.headers[0], "A");
    }

    #[test]
    fn repair_rewrites_doubled_quote_fields() {
        let fixed = repair_doubled_quotes("Artist,\"\"Untitled (nude)\"\",2001");
        assert_eq!(fixed, "Artist,\"Untitled (nude)\",2001");
    }

    #[test]
    fn repair_handles_adjacent_fields() {
        let fixed = repair_doubled_quotes("\"\"a b\"\",\"\"c d\"\"");
        assert_eq!(fixed, "\"a b\",\"c d\"");
    }

    #[test]
    fn repair_leaves_legitimate_escapes_alone() {
        // An interior doubled quote is a legal escape, not the broken shape.
        let legit = "A,\"He said \"\"hi\"\" once\",B";
        assert_eq!(repair_doubled_quotes(legit), legit);
    }

    #[test]
    fn repaired_title_parses_as_one_field() {
        let table = ingest("Artist,Title\nX,\"\"Untitled (nude)\"\"\n", &config()).unwrap();
        assert_eq!(table.rows[0]["Title"], "Untitled (nude)");
    }

    #[test]
    fn repair_can_be_disabled() {
        let config = MergeConfig::builder()
            .base_path("/p")
            .repair_quotes(false)
            .build()
            .unwrap();
        // Without the pre-pass the doubled quotes yield an empty field (the
        // parser sees "" then recovers what it can).
        let table = ingest("Artist,Title\nX,\"\"Untitled\"\"\n", &config).unwrap();
        assert_ne!(table.rows[0]["Title"], "Untitled");
    }
}
