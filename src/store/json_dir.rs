use crate::content::ContentDocument;
use crate::store::{ContentStore, StoreResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one pretty-printed JSON file per document into a directory
///
/// Files are named `<key>.json`; the directory is created on first write.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl ContentStore for JsonDirStore {
    async fn put(&self, key: &str, doc: &ContentDocument) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let json = serde_json::to_vec_pretty(doc)?;

        // Write-then-rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Stored {} ({} chunks) at {}", doc.url, doc.chunks.len(), path.display());
        Ok(())
    }
}
