//! Referat - Transcript Indexing and Retrieval
//!
//! Turns time-ordered transcript events into structured, citable documents
//! and keeps a collection of them queryable by listing, keyword, or
//! semantic similarity.
//!
//! The name "Referat" comes from the Scandinavian word for the written
//! minutes of a meeting.
//!
//! # Overview
//!
//! Referat allows you to:
//! - Parse timestamped transcript files into an event stream
//! - Summarize transcripts into a title, abstract, chapters, and passages
//!   whose every sentence cites the source timestamps it came from
//! - Store the resulting documents in a local library
//! - Retrieve passages by keyword match or semantic similarity
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `transcript` - Event model and transcript file parsing
//! - `marker` - Inline provenance markers in generated prose
//! - `chunking` - Token-budget-bounded transcript chunking
//! - `summarizer` - Summarizer adapter contract and OpenAI implementation
//! - `merge` - Merging per-chunk results into one document
//! - `indexer` - The indexing pipeline
//! - `content` - The content document model
//! - `render` - Markdown rendering with citations
//! - `embedding` - Embedding generation
//! - `library` - Document persistence and retrieval backends
//!
//! # Example
//!
//! ```rust,no_run
//! use referat::indexer::Indexer;
//! use referat::library::{self, Library};
//! use referat::summarizer::OpenAISummarizer;
//! use referat::transcript::parse_transcript_file;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let events = parse_transcript_file(std::path::Path::new("talk.txt"))?;
//!
//!     let indexer = Indexer::new(Arc::new(OpenAISummarizer::new()));
//!     let content = indexer.index(events, "en").await?;
//!
//!     let library = library::local_keyword("./library")?;
//!     library.put("talk", &content).await?;
//!
//!     let hits = library.retrieve("main argument", 5, &["talk".to_string()]).await?;
//!     for hit in hits {
//!         println!("{:.2}: {}", hit.score, hit.passage);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod content;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod library;
pub mod marker;
pub mod merge;
pub mod openai;
pub mod render;
pub mod summarizer;
pub mod transcript;

pub use error::{ReferatError, Result};
