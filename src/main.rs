//! # clinsight CLI
//!
//! Command-line interface for the clinsight pipeline.
//!
//! ## Usage
//!
//! ```bash
//! clinsight --config ./config/clinsight.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clinsight ingest` | Ingest intake fields + PDF documents, print the session id |
//! | `clinsight query` | Run a similarity query against a session's index |
//! | `clinsight report` | Generate and render the insight report for a session |
//! | `clinsight scan` | Full pipeline: ingest through rendered report |
//!
//! The Gemini API key is read once from the `GEMINI_API_KEY` environment
//! variable and threaded into the capability clients.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use clinsight::config::load_config;
use clinsight::embedding::GeminiEmbedder;
use clinsight::fetch::DocumentFetcher;
use clinsight::generate::GeminiGenerator;
use clinsight::models::{BlockKind, RenderBlock};
use clinsight::pipeline::Pipeline;
use clinsight::retrieve;
use clinsight::store::IndexStore;

/// clinsight: turn patient documents into structured clinical-insight
/// reports via session-scoped retrieval.
#[derive(Parser)]
#[command(
    name = "clinsight",
    about = "Session-scoped retrieval pipeline for clinical-insight reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/clinsight.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest intake fields and PDF documents into a new session.
    ///
    /// Prints the session identifier for later `query`/`report` calls.
    Ingest {
        /// JSON file holding the structured intake fields (one object).
        #[arg(long)]
        fields: PathBuf,

        /// Document URI to fetch and index; repeatable.
        #[arg(long = "document")]
        documents: Vec<String>,
    },

    /// Run a similarity query against an existing session's index.
    Query {
        /// Session identifier returned by `ingest`.
        session_id: String,

        /// Query text.
        text: String,

        /// Number of results.
        #[arg(long, default_value_t = 10)]
        k: usize,
    },

    /// Retrieve, generate, and render the insight report for a session.
    Report {
        /// Session identifier returned by `ingest`.
        session_id: String,

        /// Emit the block sequence as JSON for external packaging.
        #[arg(long)]
        json: bool,
    },

    /// Full pipeline: ingest, retrieve, generate, render.
    Scan {
        /// JSON file holding the structured intake fields (one object).
        #[arg(long)]
        fields: PathBuf,

        /// Document URI to fetch and index; repeatable.
        #[arg(long = "document")]
        documents: Vec<String>,

        /// Emit the block sequence as JSON for external packaging.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clinsight=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let api_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY environment variable not set")?;

    let store = IndexStore::new(&config.storage.root);
    let fetcher = DocumentFetcher::new(&config.fetch)?;
    let embedder = GeminiEmbedder::new(&config.embedding, api_key.clone())?;
    let generator = GeminiGenerator::new(&config.generation, api_key)?;

    let pipeline = Pipeline {
        config: &config,
        store: &store,
        fetcher: &fetcher,
        embedder: &embedder,
        generator: &generator,
    };

    match cli.command {
        Commands::Ingest { fields, documents } => {
            let fields = load_fields(&fields)?;
            let session_id = pipeline.ingest(&fields, &documents).await?;
            println!("session: {}", session_id);
        }
        Commands::Query {
            session_id,
            text,
            k,
        } => {
            let result =
                retrieve::retrieve(&store, &embedder, &session_id, &text, k).await?;
            if result.hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in result.hits.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {}",
                    i + 1,
                    hit.score,
                    hit.text.replace('\n', " ")
                );
            }
        }
        Commands::Report { session_id, json } => {
            let (report, blocks) = pipeline.report(&session_id).await?;
            if report.fallback {
                eprintln!("warning: analysis service unavailable, showing fallback report");
            }
            print_blocks(&blocks, json)?;
        }
        Commands::Scan {
            fields,
            documents,
            json,
        } => {
            let fields = load_fields(&fields)?;
            let outcome = pipeline.scan(&fields, &documents).await?;
            println!("session: {}", outcome.session_id);
            if outcome.report.fallback {
                eprintln!("warning: analysis service unavailable, showing fallback report");
            }
            print_blocks(&outcome.blocks, json)?;
        }
    }

    Ok(())
}

fn load_fields(path: &PathBuf) -> Result<serde_json::Map<String, serde_json::Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fields file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| "Failed to parse fields file")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("fields file must contain a single JSON object"),
    }
}

/// Print the block sequence: indented text layout, or JSON for the
/// external packaging stage.
fn print_blocks(blocks: &[RenderBlock], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(blocks)?);
        return Ok(());
    }

    for block in blocks {
        let indent = "  ".repeat(block.depth);
        match block.kind {
            BlockKind::Header => {
                println!("{}{}:", indent, block.label.as_deref().unwrap_or(""))
            }
            BlockKind::Leaf => match &block.label {
                Some(label) => println!("{}{}: {}", indent, label, block.text),
                None => println!("{}{}", indent, block.text),
            },
            BlockKind::Bullet => println!("{}- {}", indent, block.text),
        }
    }
    Ok(())
}
