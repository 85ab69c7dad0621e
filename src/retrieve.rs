//! Retrieval over a session's existing index.
//!
//! Opens the session (failing when it has none) and delegates the
//! similarity query to the store. [`build_context`] turns the ranked hits
//! into the single text blob the generator consumes; rank order is the
//! only ordering signal passed downstream.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::RetrievalResult;
use crate::store::IndexStore;

/// The fixed analytical query driving insight generation.
pub const ANALYTICAL_QUERY: &str = "Summarize the entire patient history and health reports.";

/// Retrieve the `k` most relevant chunks for `query_text` from a session.
pub async fn retrieve(
    store: &IndexStore,
    embedder: &dyn Embedder,
    session_id: &str,
    query_text: &str,
    k: usize,
) -> Result<RetrievalResult> {
    let index = store.open_existing(session_id).await?;
    let result = index.query(embedder, query_text, k).await?;
    index.close().await;
    Ok(result)
}

/// Concatenate hit texts in rank order, separated by a blank line, so the
/// generator sees the most relevant material first.
pub fn build_context(result: &RetrievalResult) -> String {
    result
        .hits
        .iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoredChunk;

    #[test]
    fn context_preserves_rank_order() {
        let result = RetrievalResult {
            hits: vec![
                ScoredChunk { text: "most relevant".into(), score: 0.9, position: 4 },
                ScoredChunk { text: "less relevant".into(), score: 0.5, position: 1 },
            ],
        };
        assert_eq!(build_context(&result), "most relevant\n\nless relevant");
    }

    #[test]
    fn empty_result_yields_empty_context() {
        assert_eq!(build_context(&RetrievalResult::default()), "");
    }
}
