use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::store::{validate_collection, DocumentStore, StoreError};

#[derive(Debug, Default)]
struct Collections {
    documents: HashMap<String, JsonValue>,
    saves: HashMap<String, usize>,
}

/// In-memory document store for tests/dev.
///
/// Also counts saves per collection so callers can assert when persistence
/// happened.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with documents.
    pub fn with_documents<I, K>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            inner
                .documents
                .extend(documents.into_iter().map(|(k, v)| (k.into(), v)));
        }
        store
    }

    /// Number of `save` calls made for `collection`.
    pub fn save_count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .map(|inner| inner.saves.get(collection).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self, collection: &str) -> Result<Option<JsonValue>, StoreError> {
        validate_collection(collection)?;
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.documents.get(collection).cloned())
    }

    fn save(&self, collection: &str, document: &JsonValue) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.documents.insert(collection.to_string(), document.clone());
        *inner.saves.entry(collection.to_string()).or_default() += 1;
        Ok(())
    }
}
