//! Index command implementation.

use super::open_library;
use crate::cli::Output;
use crate::config::Settings;
use crate::content::content_id;
use crate::indexer::Indexer;
use crate::summarizer::OpenAISummarizer;
use crate::transcript::parse_transcript_file;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the index command.
pub async fn run_index(
    input: &str,
    lang: Option<String>,
    force: bool,
    chunk_tokens: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Output::error("Remote origins are ingested upstream; pass a local transcript file.");
        anyhow::bail!("remote origin: {}", input);
    }

    let path = Path::new(input);
    if !path.exists() {
        Output::error(&format!("File not found: {}", input));
        anyhow::bail!("file not found: {}", input);
    }

    let library = open_library(&settings)?;
    let id = content_id(input);

    // At most one indexing computation per origin; the stored copy wins
    if !force && library.exists(&id).await? {
        Output::info(&format!(
            "{} is already indexed as {} (use --force to re-index)",
            input, id
        ));
        return Ok(());
    }

    Output::info(&format!("Parsing transcript from {}", input));
    let events = parse_transcript_file(path)?;
    Output::kv("Events", &events.len().to_string());

    let lang = lang.unwrap_or_else(|| settings.summarizer.language.clone());
    let summarizer = Arc::new(OpenAISummarizer::with_model(&settings.summarizer.model));
    let indexer = Indexer::new(summarizer)
        .with_max_concurrent(settings.summarizer.max_concurrent_chunks)
        .with_chunk_tokens(chunk_tokens.or(settings.summarizer.chunk_tokens))
        .with_progress(true);

    let outcome = indexer.index_detailed(events, &lang).await?;
    if outcome.chunks_failed > 0 {
        Output::warning(&format!(
            "{}/{} chunks failed; the document covers the rest",
            outcome.chunks_failed, outcome.chunks_total
        ));
    }

    let mut content = outcome.content;
    content.origin = Some(input.to_string());

    library.put(&id, &content).await?;

    Output::success(&format!("Indexed as {}", id));
    Output::kv("Title", &content.title);
    Output::kv("Chapters", &content.chapters.len().to_string());
    Output::kv("Passages", &content.passages.len().to_string());

    Ok(())
}
