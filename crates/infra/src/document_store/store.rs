use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("I/O error on collection {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize collection {collection}: {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed collection {collection}: {source}")]
    Deserialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document store lock poisoned")]
    Poisoned,
}

/// Key-value persistence of whole JSON documents by collection name.
pub trait DocumentStore: Send + Sync + core::fmt::Debug {
    /// The collection's last saved document, or `None` if it was never saved.
    fn load(&self, collection: &str) -> Result<Option<JsonValue>, StoreError>;

    /// Overwrite the collection's document.
    fn save(&self, collection: &str, document: &JsonValue) -> Result<(), StoreError>;

    /// The collection's document, or `default` if absent.
    fn load_or(&self, collection: &str, default: JsonValue) -> Result<JsonValue, StoreError> {
        Ok(self.load(collection)?.unwrap_or(default))
    }
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn load(&self, collection: &str) -> Result<Option<JsonValue>, StoreError> {
        (**self).load(collection)
    }

    fn save(&self, collection: &str, document: &JsonValue) -> Result<(), StoreError> {
        (**self).save(collection, document)
    }
}

/// Typed access on top of any [`DocumentStore`].
pub trait TypedDocuments: DocumentStore {
    fn load_as<T>(&self, collection: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.load(collection)?
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| StoreError::Deserialize {
                    collection: collection.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn load_as_or_default<T>(&self, collection: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load_as(collection)?.unwrap_or_default())
    }

    fn save_as<T>(&self, collection: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let doc = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
            collection: collection.to_string(),
            source,
        })?;
        self.save(collection, &doc)
    }
}

impl<S: DocumentStore + ?Sized> TypedDocuments for S {}

/// Collection names become file names; keep them to a safe alphabet.
pub(crate) fn validate_collection(collection: &str) -> Result<(), StoreError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}
