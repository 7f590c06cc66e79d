//! CLI module for Referat.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Referat - Transcript Indexing and Retrieval
///
/// Turns timestamped transcripts into structured, citable documents and
/// keeps them in a searchable local library. The name comes from the
/// Scandinavian word for the written minutes of a meeting.
#[derive(Parser, Debug)]
#[command(name = "referat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a transcript file into a structured document
    Index {
        /// Local transcript or subtitle text file
        input: String,

        /// Output language (e.g. en, es)
        #[arg(short, long)]
        lang: Option<String>,

        /// Force re-indexing even if this origin is already in the library
        #[arg(short, long)]
        force: bool,

        /// Override the automatic chunk token budget (advanced)
        #[arg(long)]
        chunk_tokens: Option<usize>,
    },

    /// List indexed documents
    List,

    /// Render an indexed document as markdown
    Show {
        /// Content id (or the original input path)
        id: String,

        /// Append the timestamped reference index
        #[arg(short, long)]
        references: bool,

        /// Render citations as inline links instead of stripping them
        #[arg(long)]
        inline_references: bool,
    },

    /// Search indexed documents for relevant passages
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,

        /// Restrict the search to these content ids (default: all)
        #[arg(long)]
        ids: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
