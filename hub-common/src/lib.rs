//! Hub Common - Shared configuration, errors, and logging for the multimodal hub.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Request error types
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    ChatBackend, ChatModelConfig, ClassifierConfig, Config, ConversationConfig, ModelsConfig,
    ObservabilityConfig, ServerConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

