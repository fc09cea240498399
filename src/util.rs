//! Shared text helpers for the autodoc crate.
//!
//! All lengths here are counted in chars, never bytes, and every slice lands
//! on a char boundary.

/// Code fence marker models like to wrap markdown answers in.
pub const CODE_FENCE: &str = "```";

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `n`-th char, or `text.len()` when `n` is past the end.
pub fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// The last `max_chars` chars of `text` (the whole text when shorter).
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let len = char_len(text);
    if len <= max_chars {
        return text;
    }
    &text[byte_offset(text, len - max_chars)..]
}

/// Strip a leading code fence and, only when one was stripped, a trailing one.
///
/// An answer that does not start with a fence is returned untouched even if it
/// ends with one.
pub fn strip_code_fence(answer: &str) -> &str {
    match answer.strip_prefix(CODE_FENCE) {
        Some(rest) => rest.strip_suffix(CODE_FENCE).unwrap_or(rest),
        None => answer,
    }
}
