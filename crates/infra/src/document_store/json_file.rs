use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value as JsonValue;

use super::store::{validate_collection, DocumentStore, StoreError};

/// Flat-file document store: one pretty-printed `<collection>.json` per
/// collection under a data directory.
///
/// Saves write a sibling temp file and rename it over the target, so a crash
/// mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    // Serializes writers within this process; readers never block.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| StoreError::Io {
            collection: String::new(),
            source,
        })?;

        tracing::debug!(data_dir = %data_dir.display(), "opened json document store");
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self, collection: &str) -> Result<Option<JsonValue>, StoreError> {
        validate_collection(collection)?;
        let path = self.file_path(collection);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    collection: collection.to_string(),
                    source,
                });
            }
        };

        let doc = serde_json::from_str(&raw).map_err(|source| StoreError::Deserialize {
            collection: collection.to_string(),
            source,
        })?;
        Ok(Some(doc))
    }

    fn save(&self, collection: &str, document: &JsonValue) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let io_err = |source: std::io::Error| StoreError::Io {
            collection: collection.to_string(),
            source,
        };

        let body = serde_json::to_string_pretty(document).map_err(|source| StoreError::Serialize {
            collection: collection.to_string(),
            source,
        })?;

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let target = self.file_path(collection);
        let tmp = self.data_dir.join(format!(".{collection}.json.tmp"));

        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(body.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, &target).map_err(io_err)?;

        tracing::debug!(collection, path = %target.display(), "saved collection");
        Ok(())
    }
}
