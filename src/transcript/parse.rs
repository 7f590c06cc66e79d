//! Local transcript file parsing.
//!
//! Transcript text files come in several loose line formats. Each format is
//! a [`LineGrammar`] tried in a fixed priority order; the first grammar that
//! matches a line wins. Grammars are independent and individually testable.

use super::SpeechEvent;
use crate::error::{ReferatError, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Synthetic spacing for plain prose lines without timestamps.
const PLAIN_LINE_SPACING_MS: u64 = 3000;

/// A candidate line format for transcript files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGrammar {
    /// `[1234ms] text` — bracketed millisecond timestamp.
    BracketMillis,
    /// `HH:MM:SS text` or `MM:SS text` — clock timestamp.
    Clock,
    /// `1234: text` — bare millisecond timestamp.
    BareMillis,
    /// Plain prose; assigned a synthetic timestamp from its line number.
    Plain,
}

/// The grammars in match priority order.
///
/// Clock must be tried before BareMillis so `12:34 text` is read as a clock
/// time rather than `12` milliseconds.
const GRAMMAR_ORDER: [LineGrammar; 4] = [
    LineGrammar::BracketMillis,
    LineGrammar::Clock,
    LineGrammar::BareMillis,
    LineGrammar::Plain,
];

/// Parser holding the compiled line grammars.
pub struct TranscriptParser {
    bracket_millis: Regex,
    clock: Regex,
    bare_millis: Regex,
}

impl TranscriptParser {
    pub fn new() -> Self {
        Self {
            bracket_millis: Regex::new(r"^\[(\d+)ms\]\s*(.+)$").expect("Invalid regex"),
            clock: Regex::new(r"^(\d+):(\d{1,2})(?::(\d{1,2}))?\s+(.+)$").expect("Invalid regex"),
            bare_millis: Regex::new(r"^(\d+):\s*(.+)$").expect("Invalid regex"),
        }
    }

    /// Try a single grammar against a line.
    ///
    /// `line_num` feeds the synthetic timestamp for `Plain` lines.
    pub fn parse_line(
        &self,
        grammar: LineGrammar,
        line: &str,
        line_num: usize,
    ) -> Option<SpeechEvent> {
        match grammar {
            LineGrammar::BracketMillis => {
                let caps = self.bracket_millis.captures(line)?;
                let time_ms: u64 = caps[1].parse().ok()?;
                Some(SpeechEvent::new(time_ms, caps[2].trim()))
            }
            LineGrammar::Clock => {
                let caps = self.clock.captures(line)?;
                let first: u64 = caps[1].parse().ok()?;
                let second: u64 = caps[2].parse().ok()?;
                let time_ms = match caps.get(3) {
                    // HH:MM:SS
                    Some(secs) => {
                        let secs: u64 = secs.as_str().parse().ok()?;
                        (first * 3600 + second * 60 + secs) * 1000
                    }
                    // MM:SS
                    None => (first * 60 + second) * 1000,
                };
                Some(SpeechEvent::new(time_ms, caps[4].trim()))
            }
            LineGrammar::BareMillis => {
                let caps = self.bare_millis.captures(line)?;
                let time_ms: u64 = caps[1].parse().ok()?;
                Some(SpeechEvent::new(time_ms, caps[2].trim()))
            }
            LineGrammar::Plain => {
                // Only lines that don't open with digits qualify, so a
                // malformed timestamp line is not swallowed as prose.
                if line.chars().take(10).any(|c| c.is_ascii_digit()) {
                    return None;
                }
                Some(SpeechEvent::new(
                    line_num as u64 * PLAIN_LINE_SPACING_MS,
                    line,
                ))
            }
        }
    }

    /// Parse a whole transcript body into time-ordered events.
    pub fn parse(&self, content: &str) -> Result<Vec<SpeechEvent>> {
        let mut events = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(event) = GRAMMAR_ORDER
                .iter()
                .find_map(|&grammar| self.parse_line(grammar, line, line_num))
            {
                events.push(event);
            }
        }

        if events.is_empty() {
            return Err(ReferatError::Ingest(
                "No transcript events could be parsed from input".to_string(),
            ));
        }

        // Stable sort keeps insertion order for duplicate timestamps.
        events.sort_by_key(|e| e.time_ms);

        debug!("Parsed {} transcript events", events.len());
        Ok(events)
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse transcript text into time-ordered events.
pub fn parse_transcript_text(content: &str) -> Result<Vec<SpeechEvent>> {
    TranscriptParser::new().parse(content)
}

/// Parse a local transcript file into time-ordered events.
pub fn parse_transcript_file(path: &Path) -> Result<Vec<SpeechEvent>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ReferatError::Ingest(format!("Failed to read transcript file {:?}: {}", path, e))
    })?;
    parse_transcript_text(&content)
}
