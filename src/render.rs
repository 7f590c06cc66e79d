//! Markdown rendering of content documents.
//!
//! Produces the readable document: title, abstract, passages grouped under
//! chapter headings, and a reference index that links every citation back
//! to its source timestamp.

use crate::content::ContentDocument;
use crate::marker::{rewrite_markers, strip_markers};
use crate::transcript::format_time;

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Append the timestamped reference index.
    pub include_references: bool,
    /// Rewrite markers to `[[n]](#ts-n)` citation links instead of
    /// stripping them.
    pub inline_references: bool,
}

/// Render one passage, turning markers into citation links or removing them.
pub fn render_passage(passage: &str, inline_references: bool) -> String {
    if inline_references {
        rewrite_markers(passage, |m| format!(" [[{}]](#ts-{})", m + 1, m + 1))
    } else {
        strip_markers(passage)
    }
}

/// Render the timestamped reference index with `#ts-n` anchors.
///
/// Each entry deep-links into the origin when one is known.
pub fn render_references(content: &ContentDocument) -> String {
    let mut out = String::from("## References\n");

    for (i, event) in content.transcript.iter().enumerate() {
        let time = format_time(event.time_ms);
        let stamp = match &content.origin {
            Some(origin) => format!("[{}]({}#t={})", time, origin, event.time_ms / 1000),
            None => time,
        };
        out.push_str(&format!(
            "\n##### {{#ts-{n}}}\n{n}. {stamp}: {text}\n",
            n = i + 1,
            stamp = stamp,
            text = event.text
        ));
    }

    out
}

/// Render the whole document as markdown.
pub fn render_document(content: &ContentDocument, opts: &RenderOptions) -> String {
    let mut out = String::new();

    if !content.title.is_empty() {
        out.push_str(&format!("# {}\n\n", content.title));
    }
    if !content.summary.is_empty() {
        out.push_str(&format!("{}\n\n", content.summary));
    }

    // Group passages under chapter headings; the chapter is decided once
    // per passage from its first marker.
    let mut current_chapter: Option<usize> = None;
    for passage in &content.passages {
        if let Some(marker) = content.chapter_for_passage(passage) {
            if current_chapter != Some(marker) {
                if let Some(title) = content.chapters.get(&marker) {
                    out.push_str(&format!("### {}\n\n", title));
                }
                current_chapter = Some(marker);
            }
        }
        out.push_str(&format!(
            "{}\n\n",
            render_passage(passage.trim(), opts.inline_references)
        ));
    }

    if !content.images.is_empty() {
        out.push_str("## Images\n\n");
        for image in &content.images {
            out.push_str(&format!("- {}\n", image));
        }
        out.push('\n');
    }

    if opts.include_references {
        out.push_str(&render_references(content));
    }

    out.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::SpeechEvent;
    use std::collections::BTreeMap;

    fn sample_content() -> ContentDocument {
        ContentDocument {
            origin: Some("talk.txt".to_string()),
            title: "A Sample Talk".to_string(),
            summary: "What was said.".to_string(),
            chapters: BTreeMap::from([
                (0, "Opening".to_string()),
                (2, "Closing".to_string()),
            ]),
            passages: vec![
                "First idea【0】 expanded【1】.".to_string(),
                "Final thought【2】.".to_string(),
            ],
            transcript: vec![
                SpeechEvent::new(0, "hello"),
                SpeechEvent::new(4000, "middle"),
                SpeechEvent::new(9000, "goodbye"),
            ],
            images: Vec::new(),
        }
    }

    #[test]
    fn test_passages_grouped_under_chapters() {
        let rendered = render_document(&sample_content(), &RenderOptions::default());

        let opening = rendered.find("### Opening").unwrap();
        let first = rendered.find("First idea").unwrap();
        let closing = rendered.find("### Closing").unwrap();
        let last = rendered.find("Final thought").unwrap();

        assert!(opening < first && first < closing && closing < last);
    }

    #[test]
    fn test_markers_stripped_by_default() {
        let rendered = render_document(&sample_content(), &RenderOptions::default());
        assert!(!rendered.contains('\u{3010}'));
        assert!(rendered.contains("First idea expanded."));
    }

    #[test]
    fn test_inline_references_become_links() {
        let opts = RenderOptions {
            inline_references: true,
            ..Default::default()
        };
        let rendered = render_document(&sample_content(), &opts);
        assert!(rendered.contains("[[1]](#ts-1)"));
        assert!(rendered.contains("[[3]](#ts-3)"));
    }

    #[test]
    fn test_reference_index_anchors_and_deep_links() {
        let opts = RenderOptions {
            include_references: true,
            ..Default::default()
        };
        let rendered = render_document(&sample_content(), &opts);

        assert!(rendered.contains("{#ts-1}"));
        assert!(rendered.contains("[00:00:04](talk.txt#t=4): middle"));
    }

    #[test]
    fn test_unmarked_passages_render_without_heading() {
        let content = ContentDocument {
            passages: vec!["no markers at all".to_string()],
            ..Default::default()
        };
        let rendered = render_document(&content, &RenderOptions::default());
        assert!(rendered.contains("no markers at all"));
        assert!(!rendered.contains("###"));
    }
}
