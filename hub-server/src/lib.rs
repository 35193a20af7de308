//! hub-server - Image classification, sentiment analysis, and multimodal chat
//! with per-session conversation history.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod conversation;
pub mod error;
pub mod models;
pub mod routes;

pub use conversation::{
    sanitize_history, ContentBlock, ConversationStore, ImageRef, Role, SessionEpoch, SessionSummary,
    Turn,
};
pub use error::HubError;
pub use models::{
    ChatModel, ImageClassifier, ModelError, Models, Prediction, Sentiment, SentimentAnalyzer,
    SentimentLabel,
};
pub use routes::{build_router, AppState, FALLBACK_REPLY};
