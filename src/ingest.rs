//! Ingestion pipeline: structured intake fields plus fetched PDF reports
//! become one session's vector index.
//!
//! Each intake field is flattened into a synthetic `"label: value"`
//! document so intake data participates in retrieval even though it has no
//! natural document form. A fetch or extraction failure for any document is
//! fatal to the whole call; no partially ingested session is usable.

use tracing::{debug, info};

use crate::chunk::chunk_documents;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::extract_text;
use crate::fetch::DocumentFetcher;
use crate::models::SourceDocument;
use crate::store::IndexStore;

/// Ingest intake fields and document URIs into a fresh session.
///
/// Returns the session identifier for later retrieval. Side effect:
/// durable session storage under the configured root.
pub async fn ingest(
    config: &Config,
    store: &IndexStore,
    fetcher: &DocumentFetcher,
    embedder: &dyn Embedder,
    fields: &serde_json::Map<String, serde_json::Value>,
    document_uris: &[String],
) -> Result<String> {
    let mut documents = flatten_fields(fields);

    for uri in document_uris {
        let bytes = fetcher.fetch(uri).await?;
        let text = extract_text(&bytes)?;
        debug!(uri, bytes = bytes.len(), chars = text.len(), "extracted document");
        documents.push(SourceDocument::new(uri.clone(), text));
    }

    let chunks = chunk_documents(&documents, config.chunking.size, config.chunking.overlap);

    let index = store.create_or_open(None).await?;
    index.add(embedder, &chunks).await?;
    let session_id = index.session_id().to_string();
    index.close().await;

    info!(
        session_id,
        documents = documents.len(),
        chunks = chunks.len(),
        "ingestion complete"
    );

    Ok(session_id)
}

/// One synthetic text document per intake field, in the map's key order.
fn flatten_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Vec<SourceDocument> {
    fields
        .iter()
        .map(|(key, value)| {
            SourceDocument::new(format!("field:{}", key), format!("{}: {}", key, value_text(value)))
        })
        .collect()
}

/// Render a field value as plain text: strings lose their quotes,
/// everything else keeps its JSON form.
fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_one_document_per_field() {
        let fields = json!({
            "fullName": "Joycee Mittal",
            "age": 56,
            "medicalHistory": "Has some asthma problems",
        });
        let docs = flatten_fields(fields.as_object().unwrap());

        assert_eq!(docs.len(), 3);
        assert!(docs.iter().any(|d| d.text == "age: 56"));
        assert!(docs.iter().any(|d| d.text == "fullName: Joycee Mittal"));
        assert!(docs.iter().all(|d| d.origin.starts_with("field:")));
    }

    #[test]
    fn non_string_values_keep_json_form() {
        let fields = json!({ "summary": ["a", "b"] });
        let docs = flatten_fields(fields.as_object().unwrap());
        assert_eq!(docs[0].text, r#"summary: ["a","b"]"#);
    }
}
