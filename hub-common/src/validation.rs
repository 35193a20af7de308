//! Configuration validation.
//!
//! Checks ranges and enumerated values before the server starts so that a
//! bad config file fails fast instead of surfacing as odd runtime behavior.

use thiserror::Error;

use crate::config::{
    ChatModelConfig, ClassifierConfig, Config, ConversationConfig, ObservabilityConfig,
    ServerConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port} for {field}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 5] = [
            &self.server,
            &self.conversation,
            &self.models.chat,
            &self.models.classifier,
            &self.observability,
        ];

        let mut errors: Vec<ValidationError> =
            sections.iter().filter_map(|s| s.validate().err()).collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load, apply environment overrides, and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }

        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "server.host".into(),
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "server.max_upload_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ConversationConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.max_turns == 0 {
            return Err(ValidationError::InvalidValue {
                field: "conversation.max_turns".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ChatModelConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidValue {
                field: "models.chat.temperature".into(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }

        if self.max_new_tokens <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "models.chat.max_new_tokens".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.backend == crate::config::ChatBackend::Ollama {
            if self.base_url.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: "models.chat.base_url (required for ollama backend)".into(),
                });
            }
            if self.model.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: "models.chat.model (required for ollama backend)".into(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for ClassifierConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.endpoint.is_some() && self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "models.classifier.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use test_case::test_case;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_turns() {
        let mut config = Config::default();
        config.conversation.max_turns = 0;
        match config.validate() {
            Err(ValidationError::InvalidValue { field, .. }) => {
                assert_eq!(field, "conversation.max_turns");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPort { port: 0, .. })
        ));
    }

    #[test_case("trace" ; "trace level")]
    #[test_case("DEBUG" ; "uppercase level")]
    #[test_case("warn" ; "warn level")]
    fn test_accepted_log_levels(level: &str) {
        let mut config = Config::default();
        config.observability.log_level = level.into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.observability.log_level = "verbose".into();
        let result = config.validate();
        if let Err(ValidationError::InvalidValue { field, .. }) = result {
            assert_eq!(field, "observability.log_level");
        } else {
            panic!("expected InvalidValue");
        }
    }

    #[test]
    fn test_ollama_requires_model() {
        let mut config = Config::default();
        config.models.chat.backend = ChatBackend::Ollama;
        config.models.chat.model = String::new();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_multiple_errors_are_collected() {
        let mut config = Config::default();
        config.conversation.max_turns = 0;
        config.observability.log_format = "xml".into();
        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Multiple, got {other:?}"),
        }
    }
}
