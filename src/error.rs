//! Error types for the graph session facade.

use thiserror::Error;

/// Errors reported by an injected SDK handle.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandleError {
    #[error("Graph API error: {message}")]
    Api { code: Option<i64>, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported call: {0}")]
    Unsupported(String),
}

/// Session facade errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Required configuration is missing or invalid. Construction aborts.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An action that needs a logged-in identity ran while anonymous.
    #[error("Authentication required: {0}")]
    AuthError(String),

    /// The handle or the raw HTTP primitive failed, or no accessor matched.
    #[error("SDK error: {message}")]
    SdkError {
        message: String,
        #[source]
        source: Option<HandleError>,
    },
}

impl SessionError {
    pub fn sdk(message: impl Into<String>) -> Self {
        SessionError::SdkError {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, SessionError::ConfigError(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, SessionError::AuthError(_))
    }

    pub fn is_sdk(&self) -> bool {
        matches!(self, SessionError::SdkError { .. })
    }
}

impl From<HandleError> for SessionError {
    fn from(err: HandleError) -> Self {
        SessionError::SdkError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for SessionError {
    fn from(err: config::ConfigError) -> Self {
        SessionError::ConfigError(err.to_string())
    }
}
