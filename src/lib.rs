//! # clinsight
//!
//! A session-scoped retrieval pipeline that turns heterogeneous patient
//! documents (structured intake fields plus PDF reports) into structured
//! clinical-insight reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌───────────────┐
//! │ Intake +   │──▶│  Pipeline    │──▶│ SQLite index  │
//! │ PDF URIs   │   │ Chunk+Embed │   │ (per session) │
//! └────────────┘   └─────────────┘   └──────┬────────┘
//!                                           │ retrieve
//!                                           ▼
//!                     ┌──────────┐    ┌───────────┐
//!                     │ Renderer │◀───│ Generator │
//!                     │ (blocks) │    │ (insight) │
//!                     └──────────┘    └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`chunk`] | Size/overlap text chunking |
//! | [`embedding`] | Embedding capability + vector utilities |
//! | [`store`] | Per-session vector index storage |
//! | [`fetch`] | Document fetch over the network |
//! | [`extract`] | PDF text extraction |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retrieve`] | Similarity retrieval and context assembly |
//! | [`generate`] | Structured insight generation |
//! | [`render`] | Tree-to-block document rendering |
//! | [`pipeline`] | Sequential stage orchestration |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod generate;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod retrieve;
pub mod store;

pub use error::{Error, Result};
