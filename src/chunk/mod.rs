//! Chunker: split a harvested repository blob into bounded, ordered chunks.
//!
//! Splitting happens in three passes:
//!
//! 1. **Unit split**: cut after every occurrence of the unit-boundary marker
//!    (`</file>` by default). The marker stays at the end of the unit it closes.
//! 2. **Bisection**: any unit longer than `1.5 * max_symbols` is cut in half at
//!    its char midpoint, repeatedly, until no piece exceeds the threshold.
//! 3. **Packing**: pieces are greedily packed into chunks; a new chunk starts
//!    whenever appending the next piece would push the current one past
//!    `1.25 * max_symbols`. Pieces inside a chunk are joined with `\n`.
//!
//! The output is deterministic for a given input and `max_symbols`.
//!
//! ```ignore
//! use autodoc::chunk::Chunker;
//!
//! let chunks = Chunker::new(5_000).split(&code_mix);
//! ```

use crate::util::{byte_offset, char_len};

/// Literal marker closing one logical source unit in a code mix.
pub const UNIT_BOUNDARY: &str = "</file>";

/// Pieces longer than `max_symbols * SPLIT_FACTOR` get bisected.
pub const SPLIT_FACTOR: f64 = 1.5;

/// A chunk is closed when it would grow past `max_symbols * PACK_FACTOR`.
pub const PACK_FACTOR: f64 = 1.25;

/// Separator inserted between pieces packed into the same chunk.
pub const PACK_SEPARATOR: &str = "\n";

/// Splits text into chunks bounded by `max_symbols`.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_symbols: usize,
    marker: String,
}

impl Chunker {
    /// Chunker using the default `</file>` unit marker.
    pub fn new(max_symbols: usize) -> Self {
        Self::with_marker(max_symbols, UNIT_BOUNDARY)
    }

    /// Chunker splitting on a custom literal marker.
    pub fn with_marker(max_symbols: usize, marker: impl Into<String>) -> Self {
        Self {
            max_symbols: max_symbols.max(1),
            marker: marker.into(),
        }
    }

    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    fn split_threshold(&self) -> usize {
        (self.max_symbols as f64 * SPLIT_FACTOR) as usize
    }

    fn pack_threshold(&self) -> usize {
        (self.max_symbols as f64 * PACK_FACTOR) as usize
    }

    /// Split `text` into ordered, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let units = split_units(text, &self.marker);
        let pieces = bisect_oversized(units, self.split_threshold());
        pack(pieces, self.pack_threshold())
    }
}

/// Split `text` after every occurrence of `marker`, keeping the marker with
/// the unit it closes. Zero-length units are dropped.
fn split_units<'a>(text: &'a str, marker: &str) -> Vec<&'a str> {
    if marker.is_empty() {
        return if text.is_empty() { Vec::new() } else { vec![text] };
    }

    let mut units = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(marker) {
        let end = idx + marker.len();
        units.push(&text[start..end]);
        start = end;
    }
    units.push(&text[start..]);
    units.retain(|u| !u.is_empty());
    units
}

/// Bisect every piece longer than `threshold` chars until none is.
///
/// The second half is inserted right after the first, and the scan restarts at
/// the same index so both halves are re-checked.
fn bisect_oversized(units: Vec<&str>, threshold: usize) -> Vec<&str> {
    let mut pieces = units;
    let mut i = 0;
    while i < pieces.len() {
        let piece = pieces[i];
        let len = char_len(piece);
        if len > threshold && len > 1 {
            let mid = byte_offset(piece, len / 2);
            let (head, tail) = piece.split_at(mid);
            pieces[i] = head;
            pieces.insert(i + 1, tail);
            continue;
        }
        i += 1;
    }
    pieces
}

/// Greedily pack pieces into chunks of at most `threshold` chars.
///
/// A single piece longer than the threshold becomes its own chunk.
fn pack(pieces: Vec<&str>, threshold: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(piece);
        if current.is_empty() {
            current.push_str(piece);
            current_len = piece_len;
            continue;
        }

        if current_len + PACK_SEPARATOR.len() + piece_len > threshold {
            chunks.push(std::mem::take(&mut current));
            current.push_str(piece);
            current_len = piece_len;
            continue;
        }

        current.push_str(PACK_SEPARATOR);
        current.push_str(piece);
        current_len += PACK_SEPARATOR.len() + piece_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_unit(path: &str, body_len: usize) -> String {
        format!("<file path=\"{}\">\n{}\n</file>", path, "x".repeat(body_len))
    }

    fn code_mix(units: &[String]) -> String {
        units.join("\n\n")
    }

    #[test]
    fn test_split_empty_input() {
        assert!(Chunker::new(100).split("").is_empty());
    }

    #[test]
    fn test_split_units_keeps_marker() {
        let units = split_units("a</file>b</file>", UNIT_BOUNDARY);
        assert_eq!(units, vec!["a</file>", "b</file>"]);
    }

    #[test]
    fn test_split_units_keeps_trailing_text() {
        let units = split_units("a</file>\n\n", UNIT_BOUNDARY);
        assert_eq!(units, vec!["a</file>", "\n\n"]);
    }

    #[test]
    fn test_small_units_pack_into_one_chunk() {
        let text = code_mix(&[file_unit("a.rs", 10), file_unit("b.rs", 10)]);
        let chunks = Chunker::new(1_000).split(&text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_packing_starts_new_chunk_past_threshold() {
        // Each unit is ~90 chars; threshold is 125.
        let text = code_mix(&[
            file_unit("a.rs", 60),
            file_unit("b.rs", 60),
            file_unit("c.rs", 60),
        ]);
        let chunks = Chunker::new(100).split(&text);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 125, "chunk too long: {}", char_len(chunk));
        }
    }

    #[test]
    fn test_no_chunk_is_empty() {
        let text = format!("{}</file></file>\n", file_unit("a.rs", 300));
        let chunks = Chunker::new(50).split(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_oversized_unit_is_bisected_below_split_threshold() {
        let text = file_unit("huge.rs", 10_000);
        let chunks = Chunker::new(1_000).split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 1_500, "chunk too long: {}", char_len(chunk));
        }
    }

    #[test]
    fn test_piece_between_pack_and_split_threshold_is_own_chunk() {
        // 140 chars: over 1.25 * 100 but under 1.5 * 100, so never bisected.
        let big = "y".repeat(140);
        let text = format!("small</file>{}", big);
        let chunks = Chunker::new(100).split(&text);
        assert_eq!(chunks, vec!["small</file>".to_string(), big]);
    }

    #[test]
    fn test_concatenation_reconstructs_input() {
        let text = code_mix(&[
            file_unit("a.rs", 400),
            file_unit("b.rs", 3_000),
            file_unit("c.rs", 50),
        ]);
        let chunks = Chunker::new(500).split(&text);
        let rebuilt: String = chunks.concat().replace('\n', "");
        assert_eq!(rebuilt, text.replace('\n', ""));
        assert_eq!(
            chunks.concat().matches(UNIT_BOUNDARY).count(),
            text.matches(UNIT_BOUNDARY).count()
        );
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = code_mix(&[
            file_unit("a.rs", 777),
            file_unit("b.rs", 4_321),
            file_unit("c.rs", 12),
        ]);
        let chunker = Chunker::new(600);
        let first = chunker.split(&text);
        for _ in 0..5 {
            assert_eq!(chunker.split(&text), first);
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "ж".repeat(5_000);
        let chunks = Chunker::new(1_000).split(&text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat().replace('\n', ""), text);
    }

    #[test]
    fn test_custom_marker() {
        let chunks = Chunker::with_marker(3, "|").split("ab|cd|ef");
        assert_eq!(chunks, vec!["ab|", "cd|", "ef"]);
    }

    #[test]
    fn test_zero_max_symbols_is_clamped() {
        assert_eq!(Chunker::new(0).max_symbols(), 1);
    }
}
