//! Merging per-chunk summaries into one document draft.
//!
//! Each chunk is summarized against its own chunk-local marker space; the
//! merger remaps those markers into the single global event space and folds
//! the per-chunk results together. Merging is a deterministic fold over
//! chunk index — results arrive in completion order upstream but are always
//! folded in chunk order here.

use crate::chunking::TranscriptChunk;
use crate::error::{ReferatError, Result};
use crate::marker::{encode_marker, rewrite_markers};
use std::collections::BTreeMap;
use tracing::warn;

/// Structured output of one successfully summarized chunk.
///
/// All markers are chunk-local: valid values are `0..chunk.events.len()`.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    pub title: String,
    pub summary: String,
    pub chapters: BTreeMap<usize, String>,
    pub passages: Vec<String>,
}

/// The merged draft: one global marker space, one narrative.
///
/// `title` and `summary` are taken from the first successful chunk; the
/// indexer replaces them with a synthesis pass when more than one chunk
/// succeeded.
#[derive(Debug)]
pub struct MergedSummary {
    pub title: String,
    pub summary: String,
    pub chapters: BTreeMap<usize, String>,
    pub passages: Vec<String>,
    /// Every successful chunk's abstract, in chunk order; input for the
    /// multi-chunk meta synthesis pass.
    pub abstracts: Vec<String>,
    /// Number of chunks that contributed.
    pub succeeded: usize,
    /// Markers in adapter output that were out of range for their chunk and
    /// were dropped from the remap.
    pub dropped_markers: usize,
}

/// Fold per-chunk summaries into one draft with a global marker space.
///
/// `summaries[i]` is `None` when chunk `i`'s summarizer call failed; failed
/// chunks are excluded and the rest carry the document. Fails only when no
/// chunk succeeded.
pub fn merge_summaries(
    chunks: &[TranscriptChunk],
    summaries: &[Option<ChunkSummary>],
) -> Result<MergedSummary> {
    if chunks.len() != summaries.len() {
        return Err(ReferatError::InvalidInput(format!(
            "Chunk/summary count mismatch: {} chunks, {} summaries",
            chunks.len(),
            summaries.len()
        )));
    }

    let mut title = String::new();
    let mut summary = String::new();
    let mut chapters: BTreeMap<usize, String> = BTreeMap::new();
    let mut passages: Vec<String> = Vec::new();
    let mut abstracts: Vec<String> = Vec::new();
    let mut succeeded = 0;
    let mut dropped_markers = 0;

    for (i, slot) in summaries.iter().enumerate() {
        let Some(chunk_summary) = slot else {
            continue;
        };

        let base = chunks[i].base_offset;
        let len = chunks[i].events.len();

        if succeeded == 0 {
            title = chunk_summary.title.clone();
            summary = chunk_summary.summary.clone();
        }
        succeeded += 1;
        abstracts.push(chunk_summary.summary.clone());

        // Later chunks win on marker collisions; iteration is in chunk
        // order, so this is deterministic last-write-wins.
        for (&local, chapter_title) in &chunk_summary.chapters {
            if local < len {
                chapters.insert(local + base, chapter_title.clone());
            } else {
                warn!(
                    "Chunk {} chapter marker {} out of range (chunk has {} events); dropping",
                    i, local, len
                );
                dropped_markers += 1;
            }
        }

        for passage in &chunk_summary.passages {
            let mut dropped_here = 0;
            let remapped = rewrite_markers(passage, |m| {
                if m < len {
                    encode_marker(m + base)
                } else {
                    dropped_here += 1;
                    String::new()
                }
            });
            if dropped_here > 0 {
                warn!(
                    "Chunk {} passage cited {} out-of-range markers; dropped",
                    i, dropped_here
                );
                dropped_markers += dropped_here;
            }
            passages.push(remapped);
        }
    }

    if succeeded == 0 {
        return Err(ReferatError::Summarization(
            "All chunks failed to summarize".to_string(),
        ));
    }

    Ok(MergedSummary {
        title,
        summary,
        chapters,
        passages,
        abstracts,
        succeeded,
        dropped_markers,
    })
}
