//! Show command implementation.

use super::open_library;
use crate::cli::Output;
use crate::config::Settings;
use crate::content::content_id;
use crate::error::ReferatError;
use crate::render::{render_document, RenderOptions};
use anyhow::Result;

/// Run the show command.
pub async fn run_show(
    id: &str,
    references: bool,
    inline_references: bool,
    settings: Settings,
) -> Result<()> {
    let library = open_library(&settings)?;

    // Accept either the content id or the original input it was derived from
    let content = match library.get(id).await {
        Ok(content) => content,
        Err(ReferatError::ContentNotFound(_)) => library.get(&content_id(id)).await?,
        Err(e) => {
            Output::error(&format!("Failed to load document: {}", e));
            return Err(e.into());
        }
    };

    let opts = RenderOptions {
        include_references: references,
        inline_references,
    };

    println!("{}", render_document(&content, &opts));
    Ok(())
}
