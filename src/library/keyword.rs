//! Keyword backend: BM25 ranking over passages.
//!
//! Documents persist in the shared JSON store; an in-memory BM25 index over
//! passages is rebuilt from disk on open and refreshed per document on
//! `put`. A passage's searchable text is its prose plus the transcript text
//! of the events its markers cite, so lexical matches on the underlying
//! speech also surface the passage.

use super::{DocumentStore, Library, RetrievedPassage};
use crate::content::ContentDocument;
use crate::error::Result;
use crate::marker::extract_markers;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

const BM25_K1: f32 = 1.5;
const BM25_B: f32 = 0.75;

/// One indexed passage.
struct PassageEntry {
    content_id: String,
    passage: String,
    /// Term frequencies of the searchable text.
    terms: HashMap<String, usize>,
    /// Token count of the searchable text.
    len: usize,
}

/// In-memory BM25 index over all stored passages.
#[derive(Default)]
struct Bm25Index {
    entries: Vec<PassageEntry>,
    doc_freq: HashMap<String, usize>,
}

impl Bm25Index {
    fn add_document(&mut self, id: &str, content: &ContentDocument) {
        for passage in &content.passages {
            let terms = term_frequencies(&searchable_text(content, passage));
            let len = terms.values().sum();
            for term in terms.keys() {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            self.entries.push(PassageEntry {
                content_id: id.to_string(),
                passage: passage.clone(),
                terms,
                len,
            });
        }
    }

    fn remove_document(&mut self, id: &str) {
        let removed: Vec<PassageEntry> = {
            let (gone, kept): (Vec<_>, Vec<_>) =
                std::mem::take(&mut self.entries)
                    .into_iter()
                    .partition(|e| e.content_id == id);
            self.entries = kept;
            gone
        };
        for entry in removed {
            for term in entry.terms.keys() {
                if let Some(df) = self.doc_freq.get_mut(term) {
                    *df -= 1;
                    if *df == 0 {
                        self.doc_freq.remove(term);
                    }
                }
            }
        }
    }

    fn avg_len(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(|e| e.len).sum::<usize>() as f32 / self.entries.len() as f32
    }

    fn score(&self, query_terms: &[String], entry: &PassageEntry, avg_len: f32) -> f32 {
        let n = self.entries.len() as f32;
        let mut score = 0.0;

        for term in query_terms {
            let tf = *entry.terms.get(term).unwrap_or(&0) as f32;
            if tf == 0.0 {
                continue;
            }
            let df = *self.doc_freq.get(term).unwrap_or(&0) as f32;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            let norm = tf * (BM25_K1 + 1.0)
                / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * entry.len as f32 / avg_len));
            score += idf * norm;
        }

        score
    }
}

/// Lowercased alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for token in tokenize(text) {
        *freq.entry(token).or_insert(0) += 1;
    }
    freq
}

/// A passage's prose plus the transcript text of its cited events.
fn searchable_text(content: &ContentDocument, passage: &str) -> String {
    let mut text = passage.to_string();
    for m in extract_markers(passage) {
        if let Some(event) = content.transcript.get(m) {
            text.push('\n');
            text.push_str(&event.text);
        }
    }
    text
}

/// Keyword (BM25) library.
pub struct KeywordLibrary {
    store: DocumentStore,
    index: RwLock<Bm25Index>,
}

impl KeywordLibrary {
    /// Open the library and rebuild the index from stored documents.
    pub fn open(home: PathBuf) -> Result<Self> {
        let store = DocumentStore::open(home)?;

        let mut index = Bm25Index::default();
        for id in store.ls()? {
            let content = store.get(&id)?;
            index.add_document(&id, &content);
        }
        debug!("Rebuilt keyword index over {} passages", index.entries.len());

        Ok(Self {
            store,
            index: RwLock::new(index),
        })
    }
}

#[async_trait]
impl Library for KeywordLibrary {
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

        let mut index = self.index.write().unwrap();
        index.remove_document(id);
        index.add_document(id, content);
        Ok(())
    }

    async fn retrieve(
        &self,
        query: &str,
        n: usize,
        ids: &[String],
    ) -> Result<Vec<RetrievedPassage>> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || ids.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        let index = self.index.read().unwrap();
        let avg_len = index.avg_len();

        let mut results: Vec<RetrievedPassage> = index
            .entries
            .iter()
            .filter(|e| candidates.contains(e.content_id.as_str()))
            .filter_map(|e| {
                let score = index.score(&query_terms, e, avg_len);
                (score > 0.0).then(|| RetrievedPassage {
                    content_id: e.content_id.clone(),
                    passage: e.passage.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps original passage order for equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(n);

        Ok(results)
    }
}
