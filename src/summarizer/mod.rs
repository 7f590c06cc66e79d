//! Summarizer adapter contract.
//!
//! The engine never talks to an LLM provider directly; it calls a
//! [`Summarizer`] with chunk text carrying chunk-local markers and expects
//! structured results back. The one guarantee an adapter must honor: every
//! marker in its output was present in the input it was given. The engine
//! validates that post-condition during merge and drops violating markers
//! rather than failing the chunk.

mod openai;

pub use openai::OpenAISummarizer;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token limits a summarizer model declares about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimits {
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
    /// Input budget with safety margin; chunk planning starts from this.
    pub safe_input_tokens: usize,
    pub safe_output_tokens: usize,
}

impl ModelLimits {
    /// Conservative default tier for unknown models.
    pub const fn conservative() -> Self {
        Self {
            max_input_tokens: 100_000,
            max_output_tokens: 2_000,
            safe_input_tokens: 90_000,
            safe_output_tokens: 1_500,
        }
    }

    /// Tier for large-context chat models.
    pub const fn large_context() -> Self {
        Self {
            max_input_tokens: 128_000,
            max_output_tokens: 16_384,
            safe_input_tokens: 120_000,
            safe_output_tokens: 8_000,
        }
    }

    /// Look up limits by model name, falling back to the conservative tier.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gpt-4.1") || model.starts_with("gpt-4o") {
            Self::large_context()
        } else {
            Self::conservative()
        }
    }

    /// Target chunk size: a fixed fraction of the safe input budget,
    /// leaving headroom for instructions and output.
    pub fn chunk_budget(&self) -> usize {
        (self.safe_input_tokens as f64 * crate::chunking::CHUNK_BUDGET_FRACTION) as usize
    }
}

/// Title and abstract for a document or chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    #[serde(alias = "abstract")]
    pub summary: String,
}

/// Trait for summarization providers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// The token limits of the underlying model.
    fn limits(&self) -> ModelLimits;

    /// Produce a title and abstract for the given transcript text.
    async fn get_meta(&self, text: &str, lang: &str) -> Result<DocumentMeta>;

    /// Identify chapters: a mapping from marker (position in the input's
    /// marker space) to chapter title.
    async fn get_chapters(&self, text: &str, lang: &str) -> Result<BTreeMap<usize, String>>;

    /// Rewrite the transcript into prose passages, preserving the input's
    /// markers so each sentence stays traceable. `hints` carries the
    /// chapter mapping already derived for this text, when available.
    async fn get_paragraphs(
        &self,
        text: &str,
        hints: &BTreeMap<usize, String>,
        lang: &str,
    ) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models_get_large_tier() {
        assert_eq!(ModelLimits::for_model("gpt-4.1"), ModelLimits::large_context());
        assert_eq!(ModelLimits::for_model("gpt-4o-mini"), ModelLimits::large_context());
    }

    #[test]
    fn test_unknown_model_falls_back_to_conservative() {
        assert_eq!(ModelLimits::for_model("some-future-model"), ModelLimits::conservative());
    }

    #[test]
    fn test_chunk_budget_leaves_headroom() {
        let limits = ModelLimits::conservative();
        assert_eq!(limits.chunk_budget(), 63_000);
        assert!(limits.chunk_budget() < limits.safe_input_tokens);
    }
}
