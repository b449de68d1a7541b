//! Content store abstraction
//!
//! The crawler hands every extracted [`ContentDocument`] to a store under a
//! stable key. Stores are shared between workers, so implementations take
//! `&self` and synchronize internally.

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use crate::content::ContentDocument;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while storing documents
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Destination for extracted content
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores `doc` under `key`, replacing any earlier document with that key
    async fn put(&self, key: &str, doc: &ContentDocument) -> StoreResult<()>;
}
