//! Command implementations.

mod config;
mod index;
mod list;
mod search;
mod show;

pub use config::run_config;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;
pub use show::run_show;

use crate::config::{RetrievalMethod, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::library::{self, Library};
use std::sync::Arc;

/// Open the library backend the configuration selects.
pub fn open_library(settings: &Settings) -> Result<Arc<dyn Library>> {
    let home = settings.library_dir();

    Ok(match settings.retrieval.method {
        RetrievalMethod::Listing => Arc::new(library::local_listing(home)?),
        RetrievalMethod::Keyword => Arc::new(library::local_keyword(home)?),
        RetrievalMethod::Semantic => {
            let embedder = Arc::new(OpenAIEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            ));
            Arc::new(library::local_semantic(home, embedder)?)
        }
    })
}
