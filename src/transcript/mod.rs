//! Transcript event model.
//!
//! A transcript is an ordered sequence of [`SpeechEvent`]s, the atomic unit
//! of provenance: every sentence the summarizer produces is traced back to
//! the events it was derived from via inline markers (see [`crate::marker`]).

mod parse;

pub use parse::{parse_transcript_file, parse_transcript_text, LineGrammar};

use serde::{Deserialize, Serialize};

/// One timestamped unit of transcript text.
///
/// Events are ordered by `time_ms` non-decreasing; duplicates at the same
/// timestamp keep insertion order. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechEvent {
    /// Timestamp in milliseconds from the start of the recording.
    pub time_ms: u64,
    /// Spoken text at this timestamp.
    pub text: String,
}

impl SpeechEvent {
    /// Create a new speech event.
    pub fn new(time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            text: text.into(),
        }
    }
}

/// Render one event with its marker annotation, the form the summarizer sees.
pub fn render_event(event: &SpeechEvent, marker: usize) -> String {
    format!("{}\u{3010}{}\u{3011}", event.text, marker)
}

/// Render a span of events with markers starting at `first_marker`.
///
/// One event per line; markers number the events consecutively so the
/// summarizer can cite them.
pub fn render_events(events: &[SpeechEvent], first_marker: usize) -> String {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| render_event(event, first_marker + i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a millisecond timestamp as `HH:MM:SS`.
pub fn format_time(ms: u64) -> String {
    let seconds = ms / 1000;
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(62_000), "00:01:02");
        assert_eq!(format_time(3_723_000), "01:02:03");
    }

    #[test]
    fn test_render_events_numbers_consecutively() {
        let events = vec![
            SpeechEvent::new(0, "hello"),
            SpeechEvent::new(4000, "world"),
        ];

        let rendered = render_events(&events, 5);
        assert_eq!(rendered, "hello【5】\nworld【6】");
    }

    #[test]
    fn test_render_empty_span() {
        assert_eq!(render_events(&[], 0), "");
    }
}
