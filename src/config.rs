//! Configuration System
//!
//! Application credentials, graph endpoint settings and logging configuration.
//! Loaded hierarchically (defaults, global file, workspace files, environment) through
//! the `config` crate, or built in code and handed straight to a session.

use crate::error::SessionError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod loader;
mod sources;

pub use loader::ConfigLoader;

/// Default graph endpoint family used for token exchange, subscriptions and notifications.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Application credentials
    #[serde(default)]
    pub app: AppConfig,

    /// Graph endpoint settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application configuration as supplied by the caller.
///
/// `app_id`, `app_secret` and `redirect_uri` are required; `app_perms` is the
/// comma separated permission scope requested at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, alias = "appId", alias = "appid")]
    pub app_id: Option<String>,

    #[serde(default, alias = "appSecret", alias = "appsecret")]
    pub app_secret: Option<String>,

    #[serde(default, alias = "redirectUri", alias = "redirecturi")]
    pub redirect_uri: Option<String>,

    #[serde(default, alias = "appPerms", alias = "appperms")]
    pub app_perms: Option<String>,
}

impl AppConfig {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_secret: Some(app_secret.into()),
            redirect_uri: Some(redirect_uri.into()),
            app_perms: None,
        }
    }

    pub fn with_perms(mut self, perms: impl Into<String>) -> Self {
        self.app_perms = Some(perms.into());
        self
    }

    /// Names of the required keys that are absent or empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("appId", &self.app_id),
            ("appSecret", &self.app_secret),
            ("redirectUri", &self.redirect_uri),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(key, _)| key)
        .collect()
    }

    /// Validate and freeze into the immutable credentials a session holds.
    pub fn validate(&self) -> Result<AppCredentials, SessionError> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            return Err(SessionError::ConfigError(format!(
                "Missing config vars: {}",
                missing.join(", ")
            )));
        }

        Ok(AppCredentials {
            app_id: self.app_id.clone().unwrap_or_default(),
            app_secret: self.app_secret.clone().unwrap_or_default(),
            redirect_uri: self.redirect_uri.clone().unwrap_or_default(),
            app_perms: self.app_perms.clone().unwrap_or_default(),
        })
    }
}

/// Validated application credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    /// Requested permission scope, empty when unset
    pub app_perms: String,
}

/// Graph endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL for raw graph calls (no trailing slash required)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl GraphConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base_url '{}': {}", self.base_url, e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!(
                "Invalid base_url '{}': scheme must be http or https",
                self.base_url
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    App(String),
    Graph(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::App(msg) => write!(f, "App: {}", msg),
            ValidationError::Graph(msg) => write!(f, "Graph: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SessionConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.app.validate() {
            errors.push(ValidationError::App(e.to_string()));
        }

        if let Err(e) = self.graph.validate() {
            errors.push(ValidationError::Graph(e));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
