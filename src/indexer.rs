//! Indexing pipeline: chunk, summarize, merge.
//!
//! Coordinates the whole path from an event sequence to a finished
//! [`ContentDocument`]. Chunk construction is purely computational; the
//! per-chunk summarizer calls are the only suspending operations and run
//! concurrently under a small worker pool. Results are reassembled by chunk
//! index, never by completion order, and no document is published until the
//! merge completes.

use crate::chunking::{chunk_events, CHARS_PER_TOKEN};
use crate::content::ContentDocument;
use crate::error::{ReferatError, Result};
use crate::merge::{merge_summaries, ChunkSummary, MergedSummary};
use crate::summarizer::{ModelLimits, Summarizer};
use crate::transcript::SpeechEvent;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Default number of summarizer calls in flight at once.
const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 3;

/// One-shot convenience over [`Indexer`].
pub async fn index(
    events: Vec<SpeechEvent>,
    summarizer: Arc<dyn Summarizer>,
    lang: &str,
    chunk_tokens: Option<usize>,
) -> Result<ContentDocument> {
    Indexer::new(summarizer)
        .with_chunk_tokens(chunk_tokens)
        .index(events, lang)
        .await
}

/// The indexing pipeline.
pub struct Indexer {
    summarizer: Arc<dyn Summarizer>,
    max_concurrent_chunks: usize,
    chunk_tokens: Option<usize>,
    show_progress: bool,
}

/// An indexing result with chunk-level observability.
#[derive(Debug)]
pub struct IndexOutcome {
    pub content: ContentDocument,
    pub chunks_total: usize,
    pub chunks_failed: usize,
}

impl IndexOutcome {
    /// Fraction of chunks whose summarizer call failed.
    pub fn failure_ratio(&self) -> f64 {
        if self.chunks_total == 0 {
            0.0
        } else {
            self.chunks_failed as f64 / self.chunks_total as f64
        }
    }
}

impl Indexer {
    /// Create an indexer over the given summarizer.
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarizer,
            max_concurrent_chunks: DEFAULT_MAX_CONCURRENT_CHUNKS,
            chunk_tokens: None,
            show_progress: false,
        }
    }

    /// Bound the summarizer worker pool.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent.max(1);
        self
    }

    /// Override the automatic chunk token budget.
    pub fn with_chunk_tokens(mut self, chunk_tokens: Option<usize>) -> Self {
        self.chunk_tokens = chunk_tokens;
        self
    }

    /// Show a progress bar while chunks are summarized.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Index a transcript into a content document.
    pub async fn index(&self, events: Vec<SpeechEvent>, lang: &str) -> Result<ContentDocument> {
        self.index_detailed(events, lang).await.map(|outcome| outcome.content)
    }

    /// Index a transcript, reporting chunk failure counts alongside the
    /// document.
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub async fn index_detailed(
        &self,
        events: Vec<SpeechEvent>,
        lang: &str,
    ) -> Result<IndexOutcome> {
        if events.is_empty() {
            return Err(ReferatError::InvalidInput(
                "Cannot index an empty transcript".to_string(),
            ));
        }

        let limits = self.summarizer.limits();
        let target_tokens = self.chunk_tokens.unwrap_or_else(|| limits.chunk_budget());
        let chunks = chunk_events(&events, target_tokens)?;

        info!(
            "Indexing {} events in {} chunks ({} tokens per chunk)",
            events.len(),
            chunks.len(),
            target_tokens
        );

        let pb = if self.show_progress && chunks.len() > 1 {
            let pb = ProgressBar::new(chunks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.green} Summarizing [{bar:30.cyan/blue}] {pos}/{len}")
                    .unwrap()
                    .progress_chars("█▓░"),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        // Calls complete in any order; results land in their chunk's slot so
        // the merge below is a deterministic fold over chunk index.
        let mut slots: Vec<Option<ChunkSummary>> = Vec::new();
        slots.resize_with(chunks.len(), || None);

        {
            let mut in_flight = stream::iter(chunks.iter().enumerate().map(|(i, chunk)| {
                let text = chunk.render();
                async move { (i, self.summarize_chunk(&text, lang).await) }
            }))
            .buffer_unordered(self.max_concurrent_chunks);

            while let Some((i, result)) = in_flight.next().await {
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                match result {
                    Ok(summary) => slots[i] = Some(summary),
                    Err(e) => warn!("Chunk {} failed: {}", i, e),
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let merged = merge_summaries(&chunks, &slots)?;
        let chunks_failed = chunks.len() - merged.succeeded;
        if chunks_failed > 0 {
            warn!(
                "{}/{} chunks failed; document built from the remaining {}",
                chunks_failed,
                chunks.len(),
                merged.succeeded
            );
        }
        if merged.dropped_markers > 0 {
            warn!(
                "Dropped {} out-of-range markers from summarizer output",
                merged.dropped_markers
            );
        }

        let (title, summary) = if merged.succeeded > 1 {
            self.synthesize_meta(&merged, &limits, lang).await
        } else {
            (merged.title.clone(), merged.summary.clone())
        };

        let content = ContentDocument {
            origin: None,
            title,
            summary,
            chapters: merged.chapters,
            passages: merged.passages,
            transcript: events,
            images: Vec::new(),
        };

        Ok(IndexOutcome {
            content,
            chunks_total: chunks.len(),
            chunks_failed,
        })
    }

    /// Run the three summarizer operations for one chunk.
    async fn summarize_chunk(&self, text: &str, lang: &str) -> Result<ChunkSummary> {
        let meta = self.summarizer.get_meta(text, lang).await?;
        let chapters = self.summarizer.get_chapters(text, lang).await?;
        let passages = self.summarizer.get_paragraphs(text, &chapters, lang).await?;

        Ok(ChunkSummary {
            title: meta.title,
            summary: meta.summary,
            chapters,
            passages,
        })
    }

    /// One bounded synthesis pass over the per-chunk abstracts, producing
    /// the document's single title and abstract. Falls back to the first
    /// successful chunk's meta if the synthesis call fails.
    async fn synthesize_meta(
        &self,
        merged: &MergedSummary,
        limits: &ModelLimits,
        lang: &str,
    ) -> (String, String) {
        let mut combined = merged.abstracts.join("\n\n");

        let max_chars = limits.safe_input_tokens * CHARS_PER_TOKEN;
        if combined.len() > max_chars {
            let mut cut = max_chars;
            while !combined.is_char_boundary(cut) {
                cut -= 1;
            }
            combined.truncate(cut);
        }

        match self.summarizer.get_meta(&combined, lang).await {
            Ok(meta) => (meta.title, meta.summary),
            Err(e) => {
                warn!("Meta synthesis failed, keeping first chunk's meta: {}", e);
                (merged.title.clone(), merged.summary.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{encode_marker, extract_markers};
    use crate::summarizer::DocumentMeta;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes every input marker back in one passage; fails on chunks whose
    /// text contains "FAIL".
    struct MockSummarizer {
        meta_calls: AtomicUsize,
    }

    impl MockSummarizer {
        fn new() -> Self {
            Self {
                meta_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Summarizer for MockSummarizer {
        fn limits(&self) -> ModelLimits {
            ModelLimits::conservative()
        }

        async fn get_meta(&self, text: &str, _lang: &str) -> Result<DocumentMeta> {
            self.meta_calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("FAIL") {
                return Err(ReferatError::Summarization("mock transport error".to_string()));
            }
            Ok(DocumentMeta {
                title: "Mock Title".to_string(),
                summary: format!("abstract over {} bytes", text.len()),
            })
        }

        async fn get_chapters(&self, text: &str, _lang: &str) -> Result<BTreeMap<usize, String>> {
            if text.contains("FAIL") {
                return Err(ReferatError::Summarization("mock transport error".to_string()));
            }
            let first = extract_markers(text).into_iter().next().unwrap_or(0);
            Ok(BTreeMap::from([(first, "Mock Chapter".to_string())]))
        }

        async fn get_paragraphs(
            &self,
            text: &str,
            _hints: &BTreeMap<usize, String>,
            _lang: &str,
        ) -> Result<Vec<String>> {
            if text.contains("FAIL") {
                return Err(ReferatError::Summarization("mock transport error".to_string()));
            }
            let cited: String = extract_markers(text)
                .into_iter()
                .map(encode_marker)
                .collect();
            Ok(vec![format!("prose{}", cited)])
        }
    }

    fn make_events(n: usize) -> Vec<SpeechEvent> {
        (0..n)
            .map(|i| SpeechEvent::new(i as u64 * 4000, format!("spoken line {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_transcript_is_rejected() {
        let indexer = Indexer::new(Arc::new(MockSummarizer::new()));
        assert!(indexer.index(Vec::new(), "en").await.is_err());
    }

    #[tokio::test]
    async fn test_single_chunk_fast_path() {
        let summarizer = Arc::new(MockSummarizer::new());
        let indexer = Indexer::new(summarizer.clone());

        let outcome = indexer.index_detailed(make_events(5), "en").await.unwrap();

        assert_eq!(outcome.chunks_total, 1);
        assert_eq!(outcome.chunks_failed, 0);
        // Pass-through: the one chunk's meta is the document's meta, with
        // no extra synthesis call.
        assert_eq!(summarizer.meta_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.content.title, "Mock Title");
        assert_eq!(outcome.content.transcript.len(), 5);
    }

    #[tokio::test]
    async fn test_multi_chunk_markers_resolve_globally() {
        let summarizer = Arc::new(MockSummarizer::new());
        // Tiny budget: every event lands in its own chunk
        let indexer = Indexer::new(summarizer.clone()).with_chunk_tokens(Some(1));

        let events = make_events(6);
        let outcome = indexer.index_detailed(events, "en").await.unwrap();

        assert_eq!(outcome.chunks_total, 6);
        assert_eq!(outcome.content.passages.len(), 6);

        // Passages stay in chunk order and cite exactly the global indices
        let mut seen = Vec::new();
        for passage in &outcome.content.passages {
            seen.extend(extract_markers(passage));
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);

        // Per-chunk meta calls plus one synthesis pass
        assert_eq!(summarizer.meta_calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_partial_failure_tolerated() {
        let summarizer = Arc::new(MockSummarizer::new());
        let indexer = Indexer::new(summarizer).with_chunk_tokens(Some(1));

        let mut events = make_events(10);
        events[2].text = "FAIL line 2".to_string();
        events[7].text = "FAIL line 7".to_string();

        let outcome = indexer.index_detailed(events, "en").await.unwrap();

        assert_eq!(outcome.chunks_total, 10);
        assert_eq!(outcome.chunks_failed, 2);
        assert!((outcome.failure_ratio() - 0.2).abs() < 1e-9);
        assert_eq!(outcome.content.passages.len(), 8);

        let mut seen = Vec::new();
        for passage in &outcome.content.passages {
            seen.extend(extract_markers(passage));
        }
        assert_eq!(seen, vec![0, 1, 3, 4, 5, 6, 8, 9]);
    }

    #[tokio::test]
    async fn test_partially_failed_document_still_stores_and_loads() {
        use crate::library::{local_listing, Library};

        let indexer = Indexer::new(Arc::new(MockSummarizer::new())).with_chunk_tokens(Some(1));

        let mut events = make_events(10);
        events[2].text = "FAIL line 2".to_string();
        events[7].text = "FAIL line 7".to_string();

        let mut content = indexer.index(events, "en").await.unwrap();
        content.origin = Some("partial.txt".to_string());

        let dir = tempfile::tempdir().unwrap();
        let library = local_listing(dir.path()).unwrap();
        library.put("partial", &content).await.unwrap();

        let loaded = library.get("partial").await.unwrap();
        assert_eq!(loaded.passages.len(), 8);
        assert_eq!(loaded.transcript.len(), 10);
        assert_eq!(library.ls().await.unwrap(), vec!["partial"]);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_a_hard_error() {
        let indexer = Indexer::new(Arc::new(MockSummarizer::new())).with_chunk_tokens(Some(1));

        let events: Vec<SpeechEvent> = (0..4)
            .map(|i| SpeechEvent::new(i as u64 * 1000, format!("FAIL {}", i)))
            .collect();

        assert!(indexer.index(events, "en").await.is_err());
    }
}
