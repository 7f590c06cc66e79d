//! Semantic backend: passage embeddings ranked by cosine similarity.
//!
//! Documents persist in the shared JSON store; passage embeddings live in a
//! SQLite table next to them and are recomputed per document on `put`.
//! Retrieval embeds the query and ranks candidate passages by similarity
//! (ascending distance = descending relevance).

use super::{DocumentStore, Library, RetrievedPassage};
use crate::content::ContentDocument;
use crate::embedding::Embedder;
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Semantic (embedding) library.
pub struct SemanticLibrary {
    store: DocumentStore,
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticLibrary {
    /// Open the library, creating the vector table if needed.
    pub fn open(home: PathBuf, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = DocumentStore::open(home)?;

        let db_path = store.home().join("vectors.db");
        let conn = Connection::open(&db_path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS passages (
                id TEXT PRIMARY KEY,
                content_id TEXT NOT NULL,
                passage_idx INTEGER NOT NULL,
                passage TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_passages_content_id ON passages(content_id);
            "#,
        )?;

        info!("Opened semantic library at {:?}", db_path);

        Ok(Self {
            store,
            conn: Mutex::new(conn),
            embedder,
        })
    }

    /// Serialize an embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize an embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl Library for SemanticLibrary {
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
        self.store.put(id, content)?;

        let embeddings = self.embedder.embed_batch(&content.passages).await?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| ReferatError::Library(format!("Failed to acquire lock: {}", e)))?;

        conn.execute("DELETE FROM passages WHERE content_id = ?1", params![id])?;

        for (idx, (passage, embedding)) in content.passages.iter().zip(embeddings.iter()).enumerate()
        {
            conn.execute(
                r#"
                INSERT INTO passages (id, content_id, passage_idx, passage, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    id,
                    idx as i64,
                    passage,
                    Self::embedding_to_bytes(embedding),
                ],
            )?;
        }

        debug!("Embedded {} passages for {}", content.passages.len(), id);
        Ok(())
    }

    async fn retrieve(
        &self,
        query: &str,
        n: usize,
        ids: &[String],
    ) -> Result<Vec<RetrievedPassage>> {
        if query.trim().is_empty() || ids.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| ReferatError::Library(format!("Failed to acquire lock: {}", e)))?;

        let mut results: Vec<RetrievedPassage> = Vec::new();

        for id in ids {
            let mut stmt = conn.prepare(
                "SELECT passage, embedding FROM passages WHERE content_id = ?1 ORDER BY passage_idx",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                let passage: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((passage, blob))
            })?;

            for row in rows {
                let (passage, blob) = row?;
                let embedding = Self::bytes_to_embedding(&blob);
                let score = cosine_similarity(&query_embedding, &embedding);
                results.push(RetrievedPassage {
                    content_id: id.clone(),
                    passage,
                    score,
                });
            }
        }

        // Stable sort keeps original passage order for equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(n);

        Ok(results)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic axis-aligned embeddings keyed by subject words.
    struct MockEmbedder;

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(if lower.contains("compiler") {
                vec![1.0, 0.0, 0.0]
            } else if lower.contains("garden") {
                vec![0.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0]
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn doc(passages: &[&str]) -> ContentDocument {
        ContentDocument {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_embedding_byte_round_trip() {
        let embedding = vec![0.5_f32, -1.25, 3.0];
        let bytes = SemanticLibrary::embedding_to_bytes(&embedding);
        assert_eq!(SemanticLibrary::bytes_to_embedding(&bytes), embedding);
    }

    #[tokio::test]
    async fn test_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            SemanticLibrary::open(dir.path().to_path_buf(), Arc::new(MockEmbedder)).unwrap();

        library
            .put(
                "talk",
                &doc(&[
                    "the compiler rejects invalid borrows",
                    "my garden grows tomatoes",
                ]),
            )
            .await
            .unwrap();

        let ids = vec!["talk".to_string()];
        let results = library.retrieve("compiler internals", 2, &ids).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].passage.contains("compiler"));
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            SemanticLibrary::open(dir.path().to_path_buf(), Arc::new(MockEmbedder)).unwrap();

        library
            .put("talk", &doc(&["compiler one", "compiler two", "garden path"]))
            .await
            .unwrap();

        let ids = vec!["talk".to_string()];
        let first = library.retrieve("compiler", 3, &ids).await.unwrap();
        let second = library.retrieve("compiler", 3, &ids).await.unwrap();

        let order1: Vec<&str> = first.iter().map(|r| r.passage.as_str()).collect();
        let order2: Vec<&str> = second.iter().map(|r| r.passage.as_str()).collect();
        assert_eq!(order1, order2);
        // Equal-score passages stay in stored order
        assert_eq!(order1[0], "compiler one");
        assert_eq!(order1[1], "compiler two");
    }

    #[tokio::test]
    async fn test_put_replaces_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            SemanticLibrary::open(dir.path().to_path_buf(), Arc::new(MockEmbedder)).unwrap();

        library.put("talk", &doc(&["compiler things"])).await.unwrap();
        library.put("talk", &doc(&["garden things"])).await.unwrap();

        let ids = vec!["talk".to_string()];
        let results = library.retrieve("garden", 5, &ids).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passage.contains("garden"));
    }

    #[tokio::test]
    async fn test_empty_candidates_yield_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            SemanticLibrary::open(dir.path().to_path_buf(), Arc::new(MockEmbedder)).unwrap();

        assert!(library.retrieve("compiler", 5, &[]).await.unwrap().is_empty());
    }
}
