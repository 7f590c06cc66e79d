//! List command implementation.

use super::open_library;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let library = open_library(&settings)?;

    let ids = library.ls().await?;
    if ids.is_empty() {
        Output::info("No documents indexed yet. Use 'referat index <file>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Indexed Documents ({})", ids.len()));
    println!();

    let mut total_passages = 0;
    for id in &ids {
        let content = library.get(id).await?;
        total_passages += content.passages.len();
        Output::content_info(
            &content.title,
            id,
            content.passages.len(),
            content.chapters.len(),
        );
    }

    println!();
    Output::kv("Total documents", &ids.len().to_string());
    Output::kv("Total passages", &total_passages.to_string());

    Ok(())
}
