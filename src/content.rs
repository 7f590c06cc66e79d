//! The persisted structured result of indexing a transcript.

use crate::transcript::SpeechEvent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A structured, citable summary of a transcript.
///
/// Created once per distinct origin by the indexing pipeline; the library
/// persists it and subsequent lookups reuse the stored copy. Mutated only
/// during construction and by the external image-extraction step, which
/// appends to `images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDocument {
    /// Source identifier (URL or file path) this document was derived from.
    pub origin: Option<String>,
    /// Document title.
    pub title: String,
    /// Abstract of the whole document.
    pub summary: String,
    /// Chapter start markers mapped to chapter titles. Sorted keys define a
    /// partition of the marker space into half-open intervals.
    pub chapters: BTreeMap<usize, String>,
    /// Generated prose passages with embedded `【n】` provenance markers,
    /// in reading order.
    pub passages: Vec<String>,
    /// The full source transcript, owned by this document.
    pub transcript: Vec<SpeechEvent>,
    /// Paths of extracted images, relative to the library home.
    pub images: Vec<String>,
}

impl Default for ContentDocument {
    fn default() -> Self {
        Self {
            origin: None,
            title: String::new(),
            summary: String::new(),
            chapters: BTreeMap::new(),
            passages: Vec::new(),
            transcript: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl ContentDocument {
    /// The sorted chapter start markers.
    pub fn chapter_markers(&self) -> Vec<usize> {
        self.chapters.keys().copied().collect()
    }

    /// The chapter a passage belongs to, judged by its first marker.
    ///
    /// Returns the chapter's start marker, or `None` for passages without
    /// markers or positioned before the first chapter.
    pub fn chapter_for_passage(&self, passage: &str) -> Option<usize> {
        let first = crate::marker::extract_markers(passage).into_iter().next()?;
        chapter_for_marker(first, &self.chapter_markers())
    }
}

/// Resolve which chapter interval a marker falls in.
///
/// `chapter_markers` must be sorted ascending. For consecutive pairs
/// `(start, end)` the marker belongs to `start` when `start <= m < end`;
/// a marker at or past the last chapter belongs to the last chapter; a
/// marker before the first chapter belongs to no chapter. Pure function,
/// no scan state.
pub fn chapter_for_marker(marker: usize, chapter_markers: &[usize]) -> Option<usize> {
    for pair in chapter_markers.windows(2) {
        if pair[0] <= marker && marker < pair[1] {
            return Some(pair[0]);
        }
    }
    match chapter_markers.last() {
        Some(&last) if marker >= last => Some(last),
        _ => None,
    }
}

/// Derive a filesystem-safe identity from an origin identifier.
///
/// A readable slug from the origin plus a short content hash, so distinct
/// origins that slug identically still get distinct ids.
pub fn content_id(origin: &str) -> String {
    let slug: String = origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');

    // Collapse runs of '-' and bound the readable part
    let mut compact = String::with_capacity(slug.len());
    let mut prev_dash = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_dash {
                compact.push('-');
            }
            prev_dash = true;
        } else {
            compact.push(c);
            prev_dash = false;
        }
    }
    compact.truncate(48);
    let compact = compact.trim_matches('-');

    let digest = Sha256::digest(origin.as_bytes());
    let tail = hex_prefix(&digest, 8);

    if compact.is_empty() {
        tail
    } else {
        format!("{}-{}", compact, tail)
    }
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes
        .iter()
        .flat_map(|b| [b >> 4, b & 0xf])
        .take(len)
        .map(|n| char::from_digit(n as u32, 16).unwrap_or('0'))
        .collect()
}
