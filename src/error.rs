//! Error taxonomy for the clinsight pipeline.
//!
//! Each stage maps its failures onto one of these variants so callers can
//! tell a fatal ingestion problem apart from a retryable generation hiccup.

use thiserror::Error;

/// Result type alias for clinsight operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the ingest → retrieve → generate → render
/// pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or status failure while fetching a source document.
    /// Fatal to the whole ingestion call.
    #[error("failed to fetch document {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    /// The extractor could not parse the fetched bytes.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// The embedding capability failed. Not retried at the store layer.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Index storage I/O failure.
    #[error("index storage failed: {0}")]
    Storage(#[from] sqlx::Error),

    /// Retrieval was attempted against a session that has no index.
    #[error("no index exists for session {0}")]
    SessionNotFound(String),

    /// Rate-limit or availability failure from the generative capability.
    /// Retried per the configured policy.
    #[error("generation transiently unavailable: {0}")]
    TransientGeneration(String),

    /// Permanent (validation-class) failure from the generative capability.
    /// Propagated immediately without consuming retry budget.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Generation succeeded but the output violated the JSON contract.
    /// Propagated immediately; never downgraded to fallback text.
    #[error("generated output violated the JSON contract: {0}")]
    MalformedOutput(String),

    /// The renderer hit a tree it cannot flatten (e.g. pathological depth).
    #[error("render failed: {0}")]
    Render(String),

    /// Filesystem failure while managing session storage.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}
