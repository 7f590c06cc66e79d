//! Search command implementation.

use super::open_library;
use crate::cli::Output;
use crate::config::Settings;
use crate::marker::strip_markers;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    ids: Vec<String>,
    settings: Settings,
) -> Result<()> {
    let library = open_library(&settings)?;

    // No explicit candidates means the whole library
    let candidates = if ids.is_empty() { library.ls().await? } else { ids };

    let spinner = Output::spinner("Searching...");
    let results = library.retrieve(query, limit, &candidates).await;
    spinner.finish_and_clear();

    match results {
        Ok(passages) => {
            if passages.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", passages.len()));

                for result in &passages {
                    Output::search_result(
                        &result.content_id,
                        result.score,
                        &strip_markers(&result.passage),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
