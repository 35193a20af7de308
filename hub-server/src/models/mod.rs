//! Model seams.
//!
//! The hub never runs model weights itself. Each capability is a trait with
//! adapters that either answer locally from simple rules or forward to a model
//! server over HTTP.

mod classifier;
mod ollama;
mod rule_chat;
mod sentiment;

pub use classifier::RemoteClassifier;
pub use ollama::OllamaChat;
pub use rule_chat::RuleBasedChat;
pub use sentiment::LexiconSentiment;

use crate::conversation::{ImageRef, Turn};
use async_trait::async_trait;
use hub_common::config::{ChatBackend, ModelsConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error from a model adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not configured: {0}")]
    Unavailable(String),

    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected model response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        ModelError::Request(err.to_string())
    }
}

/// Generates an assistant reply from a sanitized history.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Name reported back to clients as `model_used`.
    fn name(&self) -> &str;

    /// The last turn of `history` is the user message being answered.
    async fn generate(&self, history: &[Turn]) -> Result<String, ModelError>;
}

/// Sentiment polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, text: &str) -> Result<Sentiment, ModelError>;
}

/// Top-1 classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, image: &ImageRef) -> Result<Prediction, ModelError>;
}

/// The set of model adapters a server runs with.
#[derive(Clone)]
pub struct Models {
    pub chat: Arc<dyn ChatModel>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub classifier: Option<Arc<dyn ImageClassifier>>,
}

impl Models {
    /// Build adapters from configuration.
    pub fn from_config(config: &ModelsConfig) -> Self {
        let chat: Arc<dyn ChatModel> = match config.chat.backend {
            ChatBackend::RuleBased => Arc::new(RuleBasedChat::new()),
            ChatBackend::Ollama => Arc::new(OllamaChat::from_config(&config.chat)),
        };

        let classifier = config
            .classifier
            .endpoint
            .as_deref()
            .map(|endpoint| {
                Arc::new(RemoteClassifier::new(endpoint, config.classifier.timeout_secs))
                    as Arc<dyn ImageClassifier>
            });

        tracing::info!(
            chat = chat.name(),
            classifier = classifier.as_ref().map_or("none", |c| c.name()),
            "Model adapters ready"
        );

        Self {
            chat,
            sentiment: Arc::new(LexiconSentiment::new()),
            classifier,
        }
    }
}

impl Default for Models {
    fn default() -> Self {
        Self {
            chat: Arc::new(RuleBasedChat::new()),
            sentiment: Arc::new(LexiconSentiment::new()),
            classifier: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let models = Models::from_config(&ModelsConfig::default());
        assert_eq!(models.chat.name(), "Simple Rule-based Chat");
        assert!(models.classifier.is_none());
    }

    #[test]
    fn test_from_ollama_config() {
        let mut config = ModelsConfig::default();
        config.chat.backend = ChatBackend::Ollama;
        config.classifier.endpoint = Some("http://localhost:9000/predict".into());

        let models = Models::from_config(&config);
        assert_eq!(models.chat.name(), "llava");
        assert_eq!(models.classifier.unwrap().name(), "remote-classifier");
    }

    #[test]
    fn test_sentiment_label_serialization() {
        let s = Sentiment {
            label: SentimentLabel::Positive,
            score: 0.8,
        };
        assert_eq!(
            serde_json::to_value(s).unwrap(),
            serde_json::json!({"label": "POSITIVE", "score": 0.8})
        );
    }
}
