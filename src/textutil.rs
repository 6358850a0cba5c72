//! UTF-8-safe truncation for tool output and terminal previews.
//!
//! Slicing a `&str` at an arbitrary byte offset panics inside a multi-byte
//! character, so every cut in the crate goes through these helpers.

/// Longest prefix of `text` that is at most `max_bytes` long and ends on a
/// char boundary.
pub fn safe_prefix_by_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Cap `text` at `max_bytes`, appending `suffix` only when something was cut.
pub fn truncate_with_suffix_by_bytes(text: &str, max_bytes: usize, suffix: &str) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    format!("{}{suffix}", safe_prefix_by_bytes(text, max_bytes))
}

/// Cap `text` at `max_chars` characters, appending `suffix` when cut.
pub fn truncate_with_suffix_by_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((end, _)) => format!("{}{suffix}", &text[..end]),
    }
}

/// Collapse all whitespace runs, newlines included, into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
