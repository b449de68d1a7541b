//! Content extraction and chunking
//!
//! Turns fetched HTML into a [`ContentDocument`]: boilerplate is stripped,
//! the main content container is chosen by longest text, and the normalized
//! text is split into overlapping content-addressed chunks.

mod chunker;
mod extractor;

pub use chunker::{chunk_id, chunk_text};
pub use extractor::{normalize_whitespace, TextExtractor, CONTENT_SELECTORS, REMOVE_SELECTORS};

use crate::config::ContentConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Errors raised while turning a page into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("page has no extractable text")]
    Empty,

    #[error("extracted text too short ({chars} chars, minimum {min})")]
    TooShort { chars: usize, min: usize },
}

/// One window of document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// SHA-256 of url and offset
    pub id: String,
    pub text: String,
    /// Character offset into the document text
    pub offset: usize,
    pub word_count: usize,
}

/// Normalized content of one fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub url: String,
    pub title: Option<String>,
    pub full_text: String,
    pub word_count: usize,
    /// SHA-256 of `full_text`
    pub content_hash: String,
    pub chunks: Vec<ContentChunk>,
}

impl ContentDocument {
    /// Key under which the document is handed to a content store
    pub fn storage_key(&self) -> String {
        sha256_hex(self.url.as_bytes())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Builds documents from HTML with one fixed configuration
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    text: TextExtractor,
    window_size: usize,
    overlap: usize,
    min_chunk_chars: usize,
}

impl ContentExtractor {
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            text: TextExtractor::new(config),
            window_size: config.window_size,
            overlap: config.overlap,
            min_chunk_chars: config.min_chunk_chars,
        }
    }

    /// Extracts and chunks the main content of `html`
    ///
    /// # Returns
    ///
    /// * `Ok(ContentDocument)` - At least one chunk was produced
    /// * `Err(ExtractionError)` - The page is empty or shorter than one chunk
    pub fn extract(&self, url: &Url, html: &str) -> Result<ContentDocument, ExtractionError> {
        let (title, full_text) = self.text.extract(html);

        if full_text.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let chars = full_text.chars().count();
        if chars < self.min_chunk_chars {
            return Err(ExtractionError::TooShort {
                chars,
                min: self.min_chunk_chars,
            });
        }

        let chunks = chunk_text(
            url.as_str(),
            &full_text,
            self.window_size,
            self.overlap,
            self.min_chunk_chars,
        );
        if chunks.is_empty() {
            return Err(ExtractionError::TooShort {
                chars,
                min: self.min_chunk_chars,
            });
        }

        Ok(ContentDocument {
            url: url.to_string(),
            title,
            word_count: full_text.split_whitespace().count(),
            content_hash: sha256_hex(full_text.as_bytes()),
            full_text,
            chunks,
        })
    }
}
