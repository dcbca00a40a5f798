//! Text utilities for compiler input.

/// Strips the UTF-8 BOM (byte order mark) from the beginning of text if present.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}
