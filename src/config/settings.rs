//! Configuration settings for Referat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub summarizer: SummarizerSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.referat".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Summarizer provider (openai).
    pub provider: String,
    /// Chat model used for summarization.
    pub model: String,
    /// Output language for generated documents.
    pub language: String,
    /// Maximum concurrent per-chunk summarizer calls.
    pub max_concurrent_chunks: usize,
    /// Override the automatic chunk token budget. None = derive from the
    /// model's limits.
    pub chunk_tokens: Option<usize>,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4.1".to_string(),
            language: "en".to_string(),
            max_concurrent_chunks: 3,
            chunk_tokens: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retrieval backend selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    /// Plain listing store, no ranking.
    #[default]
    Listing,
    /// BM25 lexical ranking.
    Keyword,
    /// Embedding similarity ranking.
    Semantic,
}

impl std::str::FromStr for RetrievalMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listing" | "dumb" => Ok(RetrievalMethod::Listing),
            "keyword" => Ok(RetrievalMethod::Keyword),
            "semantic" => Ok(RetrievalMethod::Semantic),
            _ => Err(format!("Unknown retrieval method: {}", s)),
        }
    }
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMethod::Listing => write!(f, "listing"),
            RetrievalMethod::Keyword => write!(f, "keyword"),
            RetrievalMethod::Semantic => write!(f, "semantic"),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Which library backend answers queries.
    pub method: RetrievalMethod,
    /// Default number of passages to retrieve.
    pub results: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            method: RetrievalMethod::Listing,
            results: 5,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReferatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("referat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the library home directory.
    pub fn library_dir(&self) -> PathBuf {
        self.data_dir().join("library")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_retrieval_method_parsing() {
        assert_eq!(RetrievalMethod::from_str("keyword").unwrap(), RetrievalMethod::Keyword);
        assert_eq!(RetrievalMethod::from_str("SEMANTIC").unwrap(), RetrievalMethod::Semantic);
        assert_eq!(RetrievalMethod::from_str("dumb").unwrap(), RetrievalMethod::Listing);
        assert!(RetrievalMethod::from_str("psychic").is_err());
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.summarizer.model, settings.summarizer.model);
        assert_eq!(parsed.retrieval.method, settings.retrieval.method);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Settings = toml::from_str("[summarizer]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(parsed.summarizer.model, "gpt-4o");
        assert_eq!(parsed.general.log_level, "info");
    }
}
