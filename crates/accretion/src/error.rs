//! Configuration errors.
//!
//! The per-step physics never fails; these only surface while a run's
//! configuration is loaded and validated.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value '{key}' = {value}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("incompatible options: {0}")]
    Incompatible(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl std::fmt::Display, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
