//! Keyword-driven chat responder.
//!
//! Needs no model runtime, which makes it the default backend and the one the
//! HTTP tests run against.

use super::{ChatModel, ModelError};
use crate::conversation::{Role, Turn};
use async_trait::async_trait;
use rand::seq::SliceRandom;

const CHAT_RESPONSES: &[&str] = &[
    "That's interesting! Tell me more.",
    "I understand. How can I help you with that?",
    "That's a great question! Let me think about that.",
    "I see what you mean. Can you elaborate?",
    "Thanks for sharing that with me!",
    "That's really cool! What else would you like to know?",
    "I'm here to help! What can I assist you with?",
    "That's a good point. Have you considered other options?",
    "I appreciate you asking! Let me help you with that.",
    "That sounds like something worth exploring further!",
];

#[derive(Debug, Default)]
pub struct RuleBasedChat;

impl RuleBasedChat {
    pub fn new() -> Self {
        Self
    }

    fn canned() -> &'static str {
        CHAT_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CHAT_RESPONSES[0])
    }

    /// Reply to a single user message.
    pub fn respond(message: &str, has_image: bool) -> String {
        if has_image {
            return format!(
                "I can see you uploaded an image! About your message '{message}' - {}",
                Self::canned()
            );
        }

        let lower = message.to_lowercase();
        if message.trim().is_empty() {
            "I'm here to help! What would you like to talk about?".to_string()
        } else if lower.contains("hello") || lower.contains("hi") {
            "Hello! It's nice to meet you. How are you doing today?".to_string()
        } else if lower.contains("how are you") {
            "I'm doing great, thank you for asking! I'm here and ready to help.".to_string()
        } else if lower.contains("thank") {
            "You're very welcome! I'm glad I could help.".to_string()
        } else if message.contains('?') {
            format!("That's a great question about '{message}'. {}", Self::canned())
        } else {
            format!("I hear you saying '{message}'. {}", Self::canned())
        }
    }
}

#[async_trait]
impl ChatModel for RuleBasedChat {
    fn name(&self) -> &str {
        "Simple Rule-based Chat"
    }

    async fn generate(&self, history: &[Turn]) -> Result<String, ModelError> {
        let last = history
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .ok_or_else(|| ModelError::InvalidResponse("no user message to answer".into()))?;

        Ok(Self::respond(&last.text(), last.has_image()))
    }
}
