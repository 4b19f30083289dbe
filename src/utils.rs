//! Shared utility functions

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Safely truncate a string at a UTF-8 boundary
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if max_bytes >= s.len() { return s; }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Filesystem-safe name: drops everything but word characters, whitespace and
/// hyphens, then turns each whitespace run into a single underscore.
/// May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let kept = UNSAFE_FILENAME_CHARS.replace_all(name, "");
    WHITESPACE_RUN.replace_all(kept.trim(), "_").into_owned()
}

/// One-line preview of chapter text for terminal output
pub fn preview(text: &str, max_bytes: usize) -> String {
    let flat = WHITESPACE_RUN.replace_all(text.trim(), " ");
    let cut = safe_truncate(&flat, max_bytes);
    if cut.len() < flat.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}
