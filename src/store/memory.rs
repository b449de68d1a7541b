use crate::content::ContentDocument;
use crate::store::{ContentStore, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, ContentDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<ContentDocument> {
        self.lock().get(key).cloned()
    }

    /// All stored documents, ordered by URL
    pub fn documents(&self) -> Vec<ContentDocument> {
        let mut docs: Vec<_> = self.lock().values().cloned().collect();
        docs.sort_by(|a, b| a.url.cmp(&b.url));
        docs
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ContentDocument>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, key: &str, doc: &ContentDocument) -> StoreResult<()> {
        self.lock().insert(key.to_string(), doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::content::ContentExtractor;
    use url::Url;

    fn create_test_document(path: &str) -> ContentDocument {
        let url = Url::parse(&format!("https://shop.test{path}")).unwrap();
        let html = format!(
            "<html><body><main><p>{}</p></main></body></html>",
            "Plenty of words about this page. ".repeat(20)
        );
        ContentExtractor::new(&ContentConfig::default())
            .extract(&url, &html)
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_replace() {
        let store = MemoryStore::new();
        let doc = create_test_document("/a");
        let key = doc.storage_key();

        store.put(&key, &doc).await.unwrap();
        store.put(&key, &doc).await.unwrap();
        store
            .put("other", &create_test_document("/b"))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&key), Some(doc));
        assert_eq!(store.documents()[0].url, "https://shop.test/a");
    }
}
