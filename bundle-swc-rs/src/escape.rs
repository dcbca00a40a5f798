//! Virtual-module escape codec.
//!
//! Bundlers prefix the ids of virtual modules with a NUL byte, and plugins
//! such as CommonJS interop emit those ids verbatim inside import
//! statements. The swc parser rejects NUL in its input, so every compiler
//! call is wrapped in [`encode`] / [`decode`], swapping the byte for
//! [`VIRTUAL_MODULE_MARKER`] and back.
//!
//! This is a compatibility shim. Remove it once the parser accepts NUL
//! characters inside string literals.
//!
//! `decode(encode(x)) == x` holds for every `x` that does not already
//! contain the marker text.

use std::borrow::Cow;

/// Leading byte of virtual module ids.
pub const VIRTUAL_MODULE_SENTINEL: char = '\0';

/// Replacement text for [`VIRTUAL_MODULE_SENTINEL`] while inside the compiler.
pub const VIRTUAL_MODULE_MARKER: &str = "__BUNDLE_SWC_VIRTUAL_MODULE_NUL_ESCAPE_f5c1a9e7__";

/// Replaces every sentinel byte with the marker.
pub fn encode(text: &str) -> Cow<'_, str> {
    if text.contains(VIRTUAL_MODULE_SENTINEL) {
        Cow::Owned(text.replace(VIRTUAL_MODULE_SENTINEL, VIRTUAL_MODULE_MARKER))
    } else {
        Cow::Borrowed(text)
    }
}

/// Replaces every marker with the sentinel byte.
pub fn decode(text: &str) -> Cow<'_, str> {
    if text.contains(VIRTUAL_MODULE_MARKER) {
        Cow::Owned(text.replace(VIRTUAL_MODULE_MARKER, "\0"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Like [`decode`], for JSON text such as a source map. The sentinel only
/// ever sits inside JSON strings, where it must be written as `\u0000`.
pub fn decode_json(text: &str) -> Cow<'_, str> {
    if text.contains(VIRTUAL_MODULE_MARKER) {
        Cow::Owned(text.replace(VIRTUAL_MODULE_MARKER, "\\u0000"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether a module id belongs to another plugin's virtual module namespace.
pub fn is_virtual(id: &str) -> bool {
    id.starts_with(VIRTUAL_MODULE_SENTINEL)
}
