//! Plain listing backend.
//!
//! An identity store keyed by origin id: list, get, put. `retrieve` does
//! not rank; it passes candidate passages through in stored order so
//! callers that want ranking pick the keyword or semantic backend.

use super::{DocumentStore, Library, RetrievedPassage};
use crate::content::ContentDocument;
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Listing-only library.
pub struct ListingLibrary {
    store: DocumentStore,
}

impl ListingLibrary {
    pub fn open(home: PathBuf) -> Result<Self> {
        Ok(Self {
            store: DocumentStore::open(home)?,
        })
    }
}

#[async_trait]
impl Library for ListingLibrary {
    fn home(&self) -> &Path {
        self.store.home()
    }

    async fn ls(&self) -> Result<Vec<String>> {
        self.store.ls()
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        self.store.exists(id)
    }

    async fn get(&self, id: &str) -> Result<ContentDocument> {
        self.store.get(id)
    }

    async fn put(&self, id: &str, content: &ContentDocument) -> Result<()> {
        self.store.put(id, content)
    }

    async fn retrieve(
        &self,
        _query: &str,
        n: usize,
        ids: &[String],
    ) -> Result<Vec<RetrievedPassage>> {
        let mut results = Vec::new();

        'outer: for id in ids {
            let content = match self.store.get(id) {
                Ok(content) => content,
                // Missing candidates are a non-match, not an error
                Err(ReferatError::ContentNotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            for passage in content.passages {
                if results.len() >= n {
                    break 'outer;
                }
                results.push(RetrievedPassage {
                    content_id: id.clone(),
                    passage,
                    score: 0.0,
                });
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_passages(passages: &[&str]) -> ContentDocument {
        ContentDocument {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_put_twice_lists_once() {
        let dir = tempfile::tempdir().unwrap();
        let library = ListingLibrary::open(dir.path().to_path_buf()).unwrap();

        let doc = doc_with_passages(&["one"]);
        library.put("talk", &doc).await.unwrap();
        library.put("talk", &doc).await.unwrap();

        assert_eq!(library.ls().await.unwrap(), vec!["talk"]);
    }

    #[tokio::test]
    async fn test_retrieve_passes_candidates_through() {
        let dir = tempfile::tempdir().unwrap();
        let library = ListingLibrary::open(dir.path().to_path_buf()).unwrap();

        library
            .put("a", &doc_with_passages(&["p1", "p2"]))
            .await
            .unwrap();
        library.put("b", &doc_with_passages(&["p3"])).await.unwrap();

        let ids = vec!["a".to_string(), "b".to_string()];
        let results = library.retrieve("anything", 2, &ids).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].passage, "p1");
        assert_eq!(results[1].passage, "p2");
    }

    #[tokio::test]
    async fn test_retrieve_empty_or_all_miss_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let library = ListingLibrary::open(dir.path().to_path_buf()).unwrap();

        assert!(library.retrieve("q", 5, &[]).await.unwrap().is_empty());

        let missing = vec!["ghost".to_string()];
        assert!(library.retrieve("q", 5, &missing).await.unwrap().is_empty());
    }
}
