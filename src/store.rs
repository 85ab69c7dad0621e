//! Session-scoped vector index storage.
//!
//! Each session owns exactly one SQLite database at
//! `<root>/<session_id>/index.sqlite`, holding (text, embedding, metadata)
//! triples. Storage is partitioned by session identifier, so concurrent
//! work on different sessions cannot interfere; a single writer per session
//! is the contract for ingestion.
//!
//! Writes are append-only: chunks are never mutated or deleted within a
//! session's lifetime, and reopening an existing session never erases
//! prior content.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, Embedder};
use crate::error::{Error, Result};
use crate::models::{Chunk, RetrievalResult, ScoredChunk};

/// Factory for per-session index handles, rooted at a storage directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

/// Open handle to one session's index.
pub struct SessionIndex {
    session_id: String,
    pool: SqlitePool,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage location derived deterministically from the identifier.
    fn db_path(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id).join("index.sqlite")
    }

    /// Open a session's index, generating a fresh identifier when none is
    /// supplied. Opening an existing session keeps all prior content.
    pub async fn create_or_open(&self, session_id: Option<&str>) -> Result<SessionIndex> {
        let session_id = match session_id {
            Some(id) => {
                validate_session_id(id)?;
                id.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        let pool = self.connect(&self.db_path(&session_id), true).await?;
        migrate(&pool, &session_id).await?;

        Ok(SessionIndex { session_id, pool })
    }

    /// Open an existing session's index, failing with
    /// [`Error::SessionNotFound`] when the session has no storage.
    pub async fn open_existing(&self, session_id: &str) -> Result<SessionIndex> {
        validate_session_id(session_id)?;
        let path = self.db_path(session_id);
        if !path.is_file() {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }

        let pool = self.connect(&path, false).await?;
        Ok(SessionIndex {
            session_id: session_id.to_string(),
            pool,
        })
    }

    async fn connect(&self, path: &Path, create: bool) -> Result<SqlitePool> {
        if create {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(create)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(pool)
    }
}

/// Session identifiers become directory names, so they must stay flat.
fn validate_session_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::SessionNotFound(id.to_string()))
    }
}

async fn migrate(pool: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            origin TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO session (id, created_at) VALUES (?, ?)")
        .bind(session_id)
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;

    Ok(())
}

impl SessionIndex {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Embed each chunk's text and persist (text, embedding, metadata)
    /// together in one transaction. Append-only.
    pub async fn add(&self, embedder: &dyn Embedder, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        let mut tx = self.pool.begin().await?;
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            sqlx::query(
                "INSERT INTO chunks (id, origin, position, text, hash, embedding) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.origin)
            .bind(chunk.position)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Embed the query text and return the top-`k` chunks by cosine
    /// similarity, descending, with equal scores broken by original chunk
    /// position.
    pub async fn query(
        &self,
        embedder: &dyn Embedder,
        query_text: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        let query_vec = embedder.embed(query_text).await?;

        let rows: Vec<(String, i64, Vec<u8>)> =
            sqlx::query_as("SELECT text, position, embedding FROM chunks")
                .fetch_all(&self.pool)
                .await?;

        let mut hits: Vec<ScoredChunk> = rows
            .into_iter()
            .map(|(text, position, blob)| ScoredChunk {
                score: cosine_similarity(&query_vec, &blob_to_vec(&blob)),
                text,
                position,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);

        Ok(RetrievalResult { hits })
    }

    /// Number of chunks stored in this session.
    pub async fn chunk_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_validation() {
        assert!(validate_session_id("0864abfd-4b0c-4cf2-a887-b5a59fd2828b").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../escape").is_err());
        assert!(validate_session_id("a/b").is_err());
    }
}
