//! Configuration management for Referat.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, RetrievalMethod, RetrievalSettings, Settings,
    SummarizerSettings,
};
