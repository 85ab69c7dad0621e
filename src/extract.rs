//! Black-box text extraction for fetched documents.
//!
//! PDF bytes go through `pdf-extract` entirely in memory; no temporary
//! files are created, so there is nothing to leak on an error path. An
//! empty result is success, not failure: a scanned report can legitimately
//! contain no extractable text.

use crate::error::{Error, Result};

/// Extract plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Extraction(e.to_string()))
}
