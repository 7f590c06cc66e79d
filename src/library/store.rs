//! On-disk document persistence shared by all library backends.

use crate::content::ContentDocument;
use crate::error::{ReferatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialized envelope for one stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    stored_at: DateTime<Utc>,
    content: ContentDocument,
}

/// A directory of JSON document files, one per content id.
pub struct DocumentStore {
    home: PathBuf,
}

impl DocumentStore {
    /// Open (creating if needed) a store rooted at `home`.
    pub fn open(home: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&home)?;
        debug!("Opened document store at {:?}", home);
        Ok(Self { home })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(ReferatError::Library(format!(
                "Invalid content id: {:?}",
                id
            )));
        }
        Ok(self.home.join(format!("{}.json", id)))
    }

    /// All stored ids, sorted.
    pub fn ls(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.home)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.path_for(id)?.exists())
    }

    pub fn get(&self, id: &str) -> Result<ContentDocument> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(ReferatError::ContentNotFound(id.to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let stored: StoredDocument = serde_json::from_str(&raw)?;
        Ok(stored.content)
    }

    /// Write a document, replacing any previous copy under the same id.
    pub fn put(&self, id: &str, content: &ContentDocument) -> Result<()> {
        let path = self.path_for(id)?;
        let stored = StoredDocument {
            id: id.to_string(),
            stored_at: Utc::now(),
            content: content.clone(),
        };
        let raw = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&path, raw)?;
        debug!("Stored document {} at {:?}", id, path);
        Ok(())
    }
}
