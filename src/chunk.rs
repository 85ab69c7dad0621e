//! Size/overlap text chunker.
//!
//! Splits document text into overlapping fixed-size spans. Each window
//! prefers to end on a paragraph break (`\n\n`), then a sentence end, then
//! any whitespace, before falling back to a hard character cut on a UTF-8
//! boundary. Identical input always yields identical chunk boundaries.
//!
//! Each chunk receives a v4 UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, SourceDocument};

/// Don't bother searching for a natural boundary in the first fraction of
/// the window; a break that early would produce degenerate slivers.
const MIN_BOUNDARY_FRACTION: usize = 4;

/// Split a corpus of documents into chunk candidates.
///
/// `overlap` must be smaller than `size` (validated at config load); the
/// stride is clamped to at least one byte so progress is always made.
/// Zero-length or all-whitespace documents yield zero chunks. Chunk
/// positions are contiguous across the whole corpus, starting at 0.
pub fn chunk_documents(documents: &[SourceDocument], size: usize, overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut position: i64 = 0;

    for doc in documents {
        for span in split_text(&doc.text, size, overlap) {
            chunks.push(make_chunk(&doc.origin, position, span));
            position += 1;
        }
    }

    chunks
}

/// Split one text into overlapping spans. Returns borrowed slices trimmed
/// of surrounding whitespace; empty spans are dropped.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.len() <= size {
        return vec![trimmed];
    }

    let mut spans = Vec::new();
    let mut start = 0usize;

    while start < trimmed.len() {
        let hard_end = ceil_char_boundary(trimmed, (start + size).min(trimmed.len()));
        let end = if hard_end < trimmed.len() {
            natural_break(&trimmed[start..hard_end]).map_or(hard_end, |rel| start + rel)
        } else {
            hard_end
        };

        let span = trimmed[start..end].trim();
        if !span.is_empty() {
            spans.push(span);
        }

        if end >= trimmed.len() {
            break;
        }

        // Step back by the overlap, but always strictly forward from the
        // previous start.
        let stride = end.saturating_sub(start).saturating_sub(overlap).max(1);
        start = ceil_char_boundary(trimmed, start + stride);
    }

    spans
}

/// Find the best natural boundary inside a window: the last paragraph
/// break, else the last sentence end, else the last whitespace. Returns the
/// byte offset just past the boundary, or None when no acceptable boundary
/// exists in the latter part of the window.
fn natural_break(window: &str) -> Option<usize> {
    let floor = window.len() / MIN_BOUNDARY_FRACTION;

    if let Some(pos) = window.rfind("\n\n") {
        if pos > floor {
            return Some(pos + 2);
        }
    }
    for pat in [". ", ".\n", "? ", "! "] {
        if let Some(pos) = window.rfind(pat) {
            if pos > floor {
                return Some(pos + pat.len());
            }
        }
    }
    if let Some(pos) = window.rfind(char::is_whitespace) {
        if pos > floor {
            return Some(pos + 1);
        }
    }
    None
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn make_chunk(origin: &str, position: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        origin: origin.to_string(),
        position,
        text: text.to_string(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> SourceDocument {
        SourceDocument::new("test", text)
    }

    #[test]
    fn small_text_single_chunk() {
        let spans = split_text("Hello, world!", 1000, 50);
        assert_eq!(spans, vec!["Hello, world!"]);
    }

    #[test]
    fn empty_and_whitespace_yield_no_chunks() {
        assert!(split_text("", 1000, 50).is_empty());
        assert!(split_text("   \n\n\t  ", 1000, 50).is_empty());
        assert!(chunk_documents(&[doc(""), doc("  ")], 1000, 50).is_empty());
    }

    #[test]
    fn long_text_splits_with_overlap() {
        let text = "abcdefghij".repeat(10); // 100 chars, no natural boundaries
        let spans = split_text(&text, 40, 10);
        assert!(spans.len() > 1);
        for pair in spans.windows(2) {
            // Each successive span starts before the previous one ended.
            let tail = &pair[0][pair[0].len() - 10..];
            assert!(pair[1].starts_with(tail));
        }
    }

    #[test]
    fn prefers_paragraph_boundary() {
        let text = format!("{}\n\n{}", "alpha ".repeat(10).trim(), "beta ".repeat(10).trim());
        let spans = split_text(&text, 70, 0);
        assert!(spans[0].ends_with("alpha"));
        assert!(spans[1].starts_with("beta"));
    }

    #[test]
    fn prefers_sentence_boundary_over_hard_cut() {
        let text = "First sentence here. Second sentence follows along afterwards.";
        let spans = split_text(text, 30, 0);
        assert_eq!(spans[0], "First sentence here.");
    }

    #[test]
    fn never_splits_inside_multibyte_char() {
        let text = "héllo wörld ".repeat(20);
        for span in split_text(&text, 17, 5) {
            assert!(!span.is_empty()); // slicing would have panicked otherwise
        }
    }

    #[test]
    fn deterministic_boundaries() {
        let text = "Some paragraph.\n\nAnother paragraph that is a bit longer. And a third one.";
        let a = split_text(text, 30, 8);
        let b = split_text(text, 30, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn positions_contiguous_across_corpus() {
        let long = "one two three. ".repeat(20);
        let docs = vec![doc(&long), doc("short")];
        let chunks = chunk_documents(&docs, 50, 10);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.position, i as i64);
        }
        assert_eq!(chunks.last().unwrap().text, "short");
    }

    #[test]
    fn same_text_same_hash() {
        let chunks = chunk_documents(&[doc("alpha"), doc("alpha")], 100, 0);
        assert_eq!(chunks[0].hash, chunks[1].hash);
        assert_ne!(chunks[0].id, chunks[1].id);
    }
}
