//! Multimodal chat through a local Ollama server.
//!
//! Images travel as base64 strings in the `images` field of user messages,
//! which is how vision models such as llava receive them.

use super::{ChatModel, ModelError};
use crate::conversation::Turn;
use async_trait::async_trait;
use base64::Engine;
use hub_common::config::ChatModelConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct OllamaChat {
    base_url: String,
    model: String,
    temperature: f64,
    max_new_tokens: i64,
    system_prompt: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: i64,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaChat {
    pub fn from_config(config: &ChatModelConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_new_tokens: config.max_new_tokens,
            system_prompt: config.system_prompt.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn build_messages(&self, history: &[Turn]) -> Vec<OllamaMessage> {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut messages = Vec::with_capacity(history.len() + 1);

        if let Some(ref system) = self.system_prompt {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
                images: Vec::new(),
            });
        }

        for turn in history {
            messages.push(OllamaMessage {
                role: turn.role.as_str().to_string(),
                content: turn.text(),
                images: turn.images().map(|img| engine.encode(img.data())).collect(),
            });
        }

        messages
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, history: &[Turn]) -> Result<String, ModelError> {
        let start = Instant::now();

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(history),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_new_tokens,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            turns = history.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat generation completed"
        );

        Ok(body.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ContentBlock, ImageRef, Role};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_for(server: &MockServer) -> OllamaChat {
        OllamaChat::from_config(&ChatModelConfig {
            base_url: format!("{}/", server.uri()),
            model: "llava".into(),
            system_prompt: Some("Be concise.".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_build_messages_encodes_images() {
        let chat = OllamaChat::from_config(&ChatModelConfig::default());
        let history = vec![Turn::new(
            Role::User,
            vec![
                ContentBlock::image(ImageRef::new("image/png", b"abc".to_vec())),
                ContentBlock::text("describe"),
            ],
        )];

        let messages = chat.build_messages(&history);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "describe");
        assert_eq!(messages[0].images, vec!["YWJj".to_string()]);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llava",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "  Hi Alice!  "},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let chat = chat_for(&server);
        let history = vec![Turn::new(Role::User, vec![ContentBlock::text("hello")])];
        let reply = chat.generate(&history).await.unwrap();
        assert_eq!(reply, "Hi Alice!");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be concise.");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body["messages"][1].get("images").is_none());
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let chat = chat_for(&server);
        let history = vec![Turn::new(Role::User, vec![ContentBlock::text("hello")])];
        match chat.generate(&history).await {
            Err(ModelError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "model not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let chat = chat_for(&server);
        let history = vec![Turn::new(Role::User, vec![ContentBlock::text("hello")])];
        assert!(matches!(
            chat.generate(&history).await,
            Err(ModelError::InvalidResponse(_))
        ));
    }
}
