//! Output normalization and comparison
//!
//! Comparison is exact after normalization: CRLF and lone CR become LF and
//! surrounding whitespace is trimmed. Nothing else is forgiven.

/// Canonicalize line endings and trim surrounding whitespace
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_owned()
}

/// Whether `actual` matches `expected` after normalization
pub fn compare(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}
