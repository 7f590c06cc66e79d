//! OpenAI-backed summarizer implementation.
//!
//! Builds chat-completion requests that ask for JSON and preserve the
//! inline `【n】` markers, then extracts the first JSON value from the
//! response text.

use super::{DocumentMeta, ModelLimits, Summarizer};
use crate::error::{ReferatError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// OpenAI-based summarizer.
pub struct OpenAISummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    limits: ModelLimits,
}

impl OpenAISummarizer {
    pub fn new() -> Self {
        Self::with_model("gpt-4.1")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            limits: ModelLimits::for_model(model),
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| ReferatError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| ReferatError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| ReferatError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ReferatError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| ReferatError::Summarization("Empty response from LLM".to_string()))?;

        debug!("LLM response: {}", &content[..content.len().min(500)]);
        Ok(content.clone())
    }

    /// Extract the first JSON object from a response that may wrap it in
    /// markdown fences or prose.
    fn parse_json_object<T: serde::de::DeserializeOwned>(response: &str) -> Result<T> {
        let json_start = response.find('{');
        let json_end = response.rfind('}');

        let json_str = match (json_start, json_end) {
            (Some(start), Some(end)) if end > start => &response[start..=end],
            _ => response,
        };

        serde_json::from_str(json_str).map_err(|e| {
            ReferatError::Summarization(format!(
                "Failed to parse response: {}. Response was: {}",
                e,
                &response[..response.len().min(500)]
            ))
        })
    }

    /// Extract the first JSON array from a response.
    fn parse_json_array<T: serde::de::DeserializeOwned>(response: &str) -> Result<Vec<T>> {
        let json_start = response.find('[');
        let json_end = response.rfind(']');

        let json_str = match (json_start, json_end) {
            (Some(start), Some(end)) if end > start => &response[start..=end],
            _ => response,
        };

        serde_json::from_str(json_str).map_err(|e| {
            ReferatError::Summarization(format!(
                "Failed to parse response: {}. Response was: {}",
                e,
                &response[..response.len().min(500)]
            ))
        })
    }

    /// Parse a `{"marker": "title"}` object with stringified numeral keys.
    fn parse_chapters(response: &str) -> Result<BTreeMap<usize, String>> {
        let raw: BTreeMap<String, String> = Self::parse_json_object(response)?;

        let mut chapters = BTreeMap::new();
        for (key, title) in raw {
            let marker: usize = key.trim().parse().map_err(|_| {
                ReferatError::Summarization(format!("Non-numeric chapter marker: {:?}", key))
            })?;
            chapters.insert(marker, title);
        }
        Ok(chapters)
    }
}

impl Default for OpenAISummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    fn limits(&self) -> ModelLimits {
        self.limits
    }

    async fn get_meta(&self, text: &str, lang: &str) -> Result<DocumentMeta> {
        let system = format!(
            "You summarize transcripts. Respond in {} with a single JSON object: \
             {{\"title\": \"...\", \"summary\": \"...\"}}. The title is one line; \
             the summary is one dense paragraph. Do not include 【n】 markers in either.",
            lang
        );
        let response = self.complete(&system, text).await?;
        Self::parse_json_object(&response)
    }

    async fn get_chapters(&self, text: &str, lang: &str) -> Result<BTreeMap<usize, String>> {
        let system = format!(
            "You segment transcripts into chapters. The input text contains position \
             markers like 【12】. Respond in {} with a single JSON object mapping the \
             marker number where each chapter starts to its title, e.g. \
             {{\"0\": \"Introduction\", \"57\": \"Main argument\"}}. Only use marker \
             numbers that appear in the input.",
            lang
        );
        let response = self.complete(&system, text).await?;
        Self::parse_chapters(&response)
    }

    async fn get_paragraphs(
        &self,
        text: &str,
        hints: &BTreeMap<usize, String>,
        lang: &str,
    ) -> Result<Vec<String>> {
        let system = format!(
            "You rewrite raw transcripts into well-edited prose. The input contains \
             position markers like 【12】 after each sentence. Respond in {} with a \
             JSON array of paragraph strings covering the whole input in order. \
             Keep every marker with the sentence it follows, exactly as written; \
             never invent marker numbers.",
            lang
        );

        let user = if hints.is_empty() {
            text.to_string()
        } else {
            let outline = hints
                .iter()
                .map(|(marker, title)| format!("{}: {}", marker, title))
                .collect::<Vec<_>>()
                .join("\n");
            format!("Chapter outline (marker: title):\n{}\n\nTranscript:\n{}", outline, text)
        };

        let response = self.complete(&system, &user).await?;
        Self::parse_json_array(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_with_markdown_fences() {
        let response = r#"Here you go:

```json
{"title": "A Talk", "summary": "It was about things."}
```
"#;
        let meta: DocumentMeta = OpenAISummarizer::parse_json_object(response).unwrap();
        assert_eq!(meta.title, "A Talk");
        assert_eq!(meta.summary, "It was about things.");
    }

    #[test]
    fn test_parse_meta_accepts_abstract_alias() {
        let meta: DocumentMeta =
            OpenAISummarizer::parse_json_object(r#"{"title": "T", "abstract": "A"}"#).unwrap();
        assert_eq!(meta.summary, "A");
    }

    #[test]
    fn test_parse_chapters() {
        let chapters =
            OpenAISummarizer::parse_chapters(r#"{"0": "Intro", "42": "Closing"}"#).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[&0], "Intro");
        assert_eq!(chapters[&42], "Closing");
    }

    #[test]
    fn test_parse_chapters_rejects_bad_keys() {
        assert!(OpenAISummarizer::parse_chapters(r#"{"intro": "Intro"}"#).is_err());
    }

    #[test]
    fn test_parse_paragraphs() {
        let passages: Vec<String> =
            OpenAISummarizer::parse_json_array(r#"["First passage【0】.", "Second【3】."]"#)
                .unwrap();
        assert_eq!(passages.len(), 2);
    }
}
