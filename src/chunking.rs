//! Budget-bounded transcript chunking.
//!
//! Splits an event sequence so each chunk's rendered text (events plus
//! their marker annotations) fits within a summarizer model's safe input
//! budget. Chunk boundaries fall on event boundaries only; the chunks
//! partition the input exactly, with no overlap and no gaps.

use crate::error::{ReferatError, Result};
use crate::transcript::{render_event, SpeechEvent};
use tracing::{debug, warn};

/// Rough token estimate divisor: ~4 bytes of text per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Fraction of the model's safe input budget allotted to chunk text,
/// leaving headroom for instructions and output.
pub const CHUNK_BUDGET_FRACTION: f64 = 0.7;

/// Cheap deterministic token estimate, monotonic in text length.
///
/// The same estimate is used when planning chunk boundaries and when
/// validating input sizes, so the two can never disagree.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// A contiguous, budget-bounded slice of the global event sequence.
#[derive(Debug, Clone)]
pub struct TranscriptChunk {
    /// The events in this chunk, in transcript order.
    pub events: Vec<SpeechEvent>,
    /// Index of the first event in the global sequence; remaps chunk-local
    /// markers to global markers.
    pub base_offset: usize,
    /// Set when a single event alone exceeded the chunk budget and was
    /// given its own chunk rather than being dropped or truncated.
    pub oversized: bool,
}

impl TranscriptChunk {
    /// Render this chunk's text with chunk-local markers `0..events.len()`.
    pub fn render(&self) -> String {
        crate::transcript::render_events(&self.events, 0)
    }

    /// Estimated token count of the rendered chunk.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.render())
    }
}

/// Split events into chunks whose rendered text stays within
/// `target_tokens`.
///
/// Never fails for size alone: an event too large for any chunk is placed
/// alone and flagged oversized. An empty event sequence is malformed input.
pub fn chunk_events(events: &[SpeechEvent], target_tokens: usize) -> Result<Vec<TranscriptChunk>> {
    if events.is_empty() {
        return Err(ReferatError::InvalidInput(
            "Cannot chunk an empty event sequence".to_string(),
        ));
    }

    let mut chunks: Vec<TranscriptChunk> = Vec::new();
    let mut current: Vec<SpeechEvent> = Vec::new();
    let mut current_base = 0;
    // Byte count of the rendered chunk so far; rendered events are joined
    // with a newline, so planning matches the final render exactly.
    let mut current_bytes = 0;

    for (i, event) in events.iter().enumerate() {
        // Cost measured on the rendered form the summarizer will see, with
        // the marker this event would get at its position in the chunk.
        let event_bytes = render_event(event, current.len()).len();
        let event_tokens = event_bytes / CHARS_PER_TOKEN;

        if event_tokens > target_tokens {
            if !current.is_empty() {
                chunks.push(TranscriptChunk {
                    events: std::mem::take(&mut current),
                    base_offset: current_base,
                    oversized: false,
                });
            }
            warn!(
                "Event {} (~{} tokens) exceeds the chunk budget of {} tokens; placing it alone",
                i, event_tokens, target_tokens
            );
            chunks.push(TranscriptChunk {
                events: vec![event.clone()],
                base_offset: i,
                oversized: true,
            });
            current_base = i + 1;
            current_bytes = 0;
            continue;
        }

        let separator = if current.is_empty() { 0 } else { 1 };
        if (current_bytes + separator + event_bytes) / CHARS_PER_TOKEN > target_tokens
            && !current.is_empty()
        {
            chunks.push(TranscriptChunk {
                events: std::mem::take(&mut current),
                base_offset: current_base,
                oversized: false,
            });
            current_base = i;
            current_bytes = 0;
        }

        if !current.is_empty() {
            current_bytes += 1;
        }
        current.push(event.clone());
        current_bytes += event_bytes;
    }

    if !current.is_empty() {
        chunks.push(TranscriptChunk {
            events: current,
            base_offset: current_base,
            oversized: false,
        });
    }

    debug!(
        "Split {} events into {} chunks (budget {} tokens)",
        events.len(),
        chunks.len(),
        target_tokens
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_events(n: usize, text_len: usize) -> Vec<SpeechEvent> {
        (0..n)
            .map(|i| SpeechEvent::new(i as u64 * 4000, "x".repeat(text_len)))
            .collect()
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(chunk_events(&[], 100).is_err());
    }

    #[test]
    fn test_single_chunk_under_budget() {
        let events = make_events(10, 20);
        let chunks = chunk_events(&events, 10_000).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].base_offset, 0);
        assert_eq!(chunks[0].events.len(), 10);
        assert!(!chunks[0].oversized);
    }

    #[test]
    fn test_partition_invariant() {
        // Each rendered event is ~25 tokens; budget of 60 forces small chunks
        let events = make_events(50, 100);
        let chunks = chunk_events(&events, 60).unwrap();

        assert!(chunks.len() > 1);

        // No overlap, no gaps, strictly increasing base offsets
        let mut expected_offset = 0;
        for chunk in &chunks {
            assert_eq!(chunk.base_offset, expected_offset);
            assert!(!chunk.events.is_empty());
            expected_offset += chunk.events.len();
        }
        assert_eq!(expected_offset, events.len());

        // Concatenation in order reproduces the input exactly
        let reassembled: Vec<SpeechEvent> = chunks
            .iter()
            .flat_map(|c| c.events.iter().cloned())
            .collect();
        assert_eq!(reassembled, events);
    }

    #[test]
    fn test_chunks_respect_budget() {
        let events = make_events(40, 100);
        let target = 100;
        let chunks = chunk_events(&events, target).unwrap();

        for chunk in &chunks {
            assert!(chunk.estimated_tokens() <= target);
        }
    }

    #[test]
    fn test_oversized_event_gets_own_chunk() {
        let mut events = make_events(4, 40);
        events.insert(2, SpeechEvent::new(8000, "y".repeat(4000)));

        let chunks = chunk_events(&events, 100).unwrap();

        let oversized: Vec<&TranscriptChunk> = chunks.iter().filter(|c| c.oversized).collect();
        assert_eq!(oversized.len(), 1);
        assert_eq!(oversized[0].events.len(), 1);
        assert_eq!(oversized[0].base_offset, 2);

        // Nothing dropped
        let total: usize = chunks.iter().map(|c| c.events.len()).sum();
        assert_eq!(total, events.len());
    }

    #[test]
    fn test_render_uses_chunk_local_markers() {
        let events = make_events(30, 100);
        let chunks = chunk_events(&events, 100).unwrap();

        for chunk in &chunks[1..] {
            let rendered = chunk.render();
            assert!(rendered.contains("【0】"), "chunk text should restart markers at 0");
        }
    }

    #[test]
    fn test_estimate_is_monotonic() {
        let mut last = 0;
        for len in [0, 10, 100, 1000, 10_000] {
            let estimate = estimate_tokens(&"a".repeat(len));
            assert!(estimate >= last);
            last = estimate;
        }
    }
}
