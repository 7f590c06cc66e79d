//! Content library: persistence and retrieval over indexed documents.
//!
//! A library stores [`ContentDocument`]s keyed by origin id and answers
//! listing and retrieval queries without recomputing indexing. Three
//! interchangeable backends share one surface: a plain listing store, a
//! keyword (BM25) store, and a semantic (embedding) store.

mod keyword;
mod listing;
mod semantic;
mod store;

pub use keyword::KeywordLibrary;
pub use listing::ListingLibrary;
pub use semantic::SemanticLibrary;
pub use store::DocumentStore;

use crate::content::ContentDocument;
use crate::embedding::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A passage returned from retrieval, with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Id of the document the passage belongs to.
    pub content_id: String,
    /// The passage text, provenance markers intact.
    pub passage: String,
    /// Relevance score; higher is more relevant.
    pub score: f32,
}

/// Trait for content library backends.
///
/// `retrieve` never mutates stored content and is a pure read over whatever
/// was last `put`; zero matches — including an empty or all-miss candidate
/// set — is an empty result, not an error. `put` is an idempotent
/// overwrite. Concurrent `put`s of the same id are serialized by callers.
#[async_trait]
pub trait Library: Send + Sync {
    /// The directory this library persists into.
    fn home(&self) -> &Path;

    /// All known content ids.
    async fn ls(&self) -> Result<Vec<String>>;

    /// Whether a document is stored under this id.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Fetch a stored document. Unknown ids are an error.
    async fn get(&self, id: &str) -> Result<ContentDocument>;

    /// Store a document under an id, replacing any previous copy.
    async fn put(&self, id: &str, content: &ContentDocument) -> Result<()>;

    /// Rank the candidate documents' passages against a query and return
    /// the top `n`, descending by score, ties in original passage order.
    async fn retrieve(
        &self,
        query: &str,
        n: usize,
        ids: &[String],
    ) -> Result<Vec<RetrievedPassage>>;
}

/// Open a plain listing library rooted at `home`.
pub fn local_listing(home: impl Into<PathBuf>) -> Result<ListingLibrary> {
    ListingLibrary::open(home.into())
}

/// Open a keyword (BM25) library rooted at `home`.
pub fn local_keyword(home: impl Into<PathBuf>) -> Result<KeywordLibrary> {
    KeywordLibrary::open(home.into())
}

/// Open a semantic library rooted at `home`, embedding with `embedder`.
pub fn local_semantic(
    home: impl Into<PathBuf>,
    embedder: Arc<dyn Embedder>,
) -> Result<SemanticLibrary> {
    SemanticLibrary::open(home.into(), embedder)
}
