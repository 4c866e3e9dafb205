//! Text normalization helpers shared across pipeline stages.
//!
//! Each helper is a pure `&str -> String` pass with no shared state, applied
//! at a defined point:
//!
//! - [`normalize_cell`] — at ingestion, on every parsed cell
//! - [`clean_field`] — at assembly, on every display field about to be
//!   serialized
//! - [`slug`] — at mapping, on Artist and Title to derive file names
//!
//! Cells are normalized on the way in *and* fields are cleaned on the way
//! out: alias resolution and alt-dimension composition can reintroduce
//! whitespace, and the output side also owes downstream layout software
//! composed (NFC) Unicode.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Ingestion cell transform: collapse every run of carriage-return/line-feed
/// characters to a single space, then trim.
///
/// Multi-line cells are common in collections exports (provenance lists,
/// inscription transcriptions); page-layout data merge treats a literal line
/// break as a record separator, so they must go early.
pub fn normalize_cell(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_break = false;
    for ch in s.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(ch);
            in_break = false;
        }
    }
    out.trim().to_string()
}

/// Collapse every whitespace run to a single ASCII space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Output-side field cleaning: line breaks and whitespace runs to one space,
/// trim, then NFC-normalize for stable rendering downstream.
pub fn clean_field(s: &str) -> String {
    collapse_whitespace(s).nfc().collect()
}

/// Derive a filesystem-safe slug.
///
/// NFD-decompose, drop combining marks (so `Müller` keeps its base letters),
/// map everything outside `[A-Za-z0-9]` to a hyphen, collapse hyphen runs,
/// and trim hyphens at both ends. Pure and deterministic — the derived file
/// names must be reproducible across runs.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_hyphen = false;
    for ch in s.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_line_breaks_collapse_to_one_space() {
        assert_eq!(normalize_cell("oil on\r\ncanvas"), "oil on canvas");
        assert_eq!(normalize_cell("a\n\n\nb"), "a b");
        assert_eq!(normalize_cell("\r\ntrimmed\r\n"), "trimmed");
    }

    #[test]
    fn cell_interior_spaces_survive() {
        // Only line breaks are touched at ingestion; double spaces are the
        // assembler's problem.
        assert_eq!(normalize_cell("a  b"), "a  b");
    }

    #[test]
    fn clean_field_collapses_and_composes() {
        assert_eq!(clean_field("a \t b"), "a b");
        // e + combining acute composes to é
        assert_eq!(clean_field("Cle\u{0301}ment"), "Clément");
    }

    #[test]
    fn slug_is_deterministic() {
        let a = slug("Édouard Manet");
        let b = slug("Édouard Manet");
        assert_eq!(a, b);
        assert_eq!(a, "Edouard-Manet");
    }

    #[test]
    fn slug_charset_and_hyphen_rules() {
        let s = slug("  Un titled -- (nude, standing)  ");
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert!(!s.starts_with('-') && !s.ends_with('-'));
        assert!(!s.contains("--"));
        assert_eq!(s, "Un-titled-nude-standing");
    }

    #[test]
    fn slug_strips_diacritics_keeps_base_letters() {
        assert_eq!(slug("Müller"), "Muller");
        assert_eq!(slug("João Miró"), "Joao-Miro");
    }

    #[test]
    fn slug_of_empty_or_symbolic_input_is_empty() {
        assert_eq!(slug(""), "");
        assert_eq!(slug("???"), "");
    }
}
