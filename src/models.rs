//! Core data models used throughout clinsight.
//!
//! These types represent the documents, chunks, retrieval hits, and display
//! blocks that flow through the ingestion and reporting pipeline.

use serde::Serialize;

/// A source document after fetch + extraction, before chunking.
///
/// `origin` is either the URI the bytes came from or a synthetic
/// `field:<key>` label for intake fields. Immutable once extracted.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub origin: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// A bounded span of document text, produced by the chunker and persisted
/// (together with its embedding) in exactly one session's index.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    /// Origin reference of the source document this span was cut from.
    pub origin: String,
    /// Position of this chunk within the ingestion corpus; also the stable
    /// tie-break for equal retrieval scores.
    pub position: i64,
    pub text: String,
    pub hash: String,
}

/// One retrieval hit: chunk text with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    pub position: i64,
}

/// Ranked retrieval output, ordered by descending similarity with ties
/// broken by ascending original chunk position.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

/// The structured generation outcome handed to the renderer.
///
/// `fallback` is true when the generative capability was unavailable after
/// retries and the insight is the deterministic substitute. Callers must
/// not present such a report as authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub insight: serde_json::Value,
    pub fallback: bool,
}

/// Kind of a rendered display block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Header,
    Leaf,
    Bullet,
}

/// One unit of formatted output produced by flattening a nested record.
///
/// `depth` is a presentation hint for indentation, not structure. `numeric`
/// marks values that should get the numeric emphasis style.
#[derive(Debug, Clone, Serialize)]
pub struct RenderBlock {
    pub depth: usize,
    pub label: Option<String>,
    pub text: String,
    pub kind: BlockKind,
    pub numeric: bool,
}
