//! Document fetch over the network.
//!
//! Thin wrapper around `reqwest` that downloads raw bytes for a URI with a
//! bounded timeout. Any non-2xx status or transport failure becomes
//! [`Error::Fetch`] carrying the URI, which is fatal to the ingestion call
//! that requested it.

use anyhow::Context;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// HTTP fetcher for source documents.
pub struct DocumentFetcher {
    client: reqwest::Client,
}

impl DocumentFetcher {
    /// Build the fetch client. Construction failure is a startup problem,
    /// not a per-document fetch failure, so it reports as one.
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to construct the document fetch HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch the raw bytes behind a URI.
    pub async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self.client.get(uri).send().await.map_err(|e| Error::Fetch {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                uri: uri.to_string(),
                reason: format!("status {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Error::Fetch {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}
