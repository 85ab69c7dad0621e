//! Sequential pipeline orchestration.
//!
//! Stages run strictly in order per request: ingest → retrieve → generate →
//! render. There is no internal parallelism across stages; concurrent
//! invocations for independent sessions are safe because index storage is
//! partitioned by session identifier.

use tracing::info;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::fetch::DocumentFetcher;
use crate::generate::{generate_insight, RetryPolicy, TextGenerator};
use crate::models::{InsightReport, RenderBlock};
use crate::render::render;
use crate::retrieve::{build_context, retrieve, ANALYTICAL_QUERY};
use crate::store::IndexStore;
use crate::ingest;

/// Everything a full scan produces.
pub struct ScanOutcome {
    pub session_id: String,
    pub report: InsightReport,
    pub blocks: Vec<RenderBlock>,
}

/// Capability clients and storage threaded through the pipeline.
///
/// Holding them in one place keeps the stage functions free of global
/// state and lets tests substitute fakes for every external dependency.
pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub store: &'a IndexStore,
    pub fetcher: &'a DocumentFetcher,
    pub embedder: &'a dyn Embedder,
    pub generator: &'a dyn TextGenerator,
}

impl Pipeline<'_> {
    /// Ingest intake fields and documents into a new session.
    pub async fn ingest(
        &self,
        fields: &serde_json::Map<String, serde_json::Value>,
        document_uris: &[String],
    ) -> Result<String> {
        ingest::ingest(
            self.config,
            self.store,
            self.fetcher,
            self.embedder,
            fields,
            document_uris,
        )
        .await
    }

    /// Produce a rendered insight report from an existing session.
    pub async fn report(&self, session_id: &str) -> Result<(InsightReport, Vec<RenderBlock>)> {
        let result = retrieve(
            self.store,
            self.embedder,
            session_id,
            ANALYTICAL_QUERY,
            self.config.retrieval.top_k,
        )
        .await?;
        let context = build_context(&result);
        info!(session_id, hits = result.hits.len(), "retrieved context");

        let report = generate_insight(
            self.generator,
            RetryPolicy::from_config(&self.config.generation),
            self.config.generation.temperature,
            &context,
        )
        .await?;

        let blocks = render(&report.insight)?;
        info!(
            session_id,
            fallback = report.fallback,
            blocks = blocks.len(),
            "report rendered"
        );

        Ok((report, blocks))
    }

    /// Full scan: ingest through rendered report.
    pub async fn scan(
        &self,
        fields: &serde_json::Map<String, serde_json::Value>,
        document_uris: &[String],
    ) -> Result<ScanOutcome> {
        let session_id = self.ingest(fields, document_uris).await?;
        let (report, blocks) = self.report(&session_id).await?;
        Ok(ScanOutcome {
            session_id,
            report,
            blocks,
        })
    }
}
