use std::fmt;

/// Errors returned by notification operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The destination needed for this notification is not configured.
    /// Carries the name of the missing setting.
    NotConfigured(&'static str),
    /// The payload could not be built (e.g. empty product name)
    InvalidPayload(String),
    /// Discord (or the HTTP layer beneath serenity) rejected the request
    Discord { message: String, retryable: bool },
}

impl NotifyError {
    pub fn discord(message: impl Into<String>, retryable: bool) -> Self {
        NotifyError::Discord {
            message: message.into(),
            retryable,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Discord { retryable: true, .. })
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NotConfigured(setting) => write!(f, "{} is not configured", setting),
            NotifyError::InvalidPayload(reason) => write!(f, "invalid payload: {}", reason),
            NotifyError::Discord { message, .. } => write!(f, "Discord error: {}", message),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Errors raised while loading configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}
