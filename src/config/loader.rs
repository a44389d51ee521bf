//! Layered configuration loading.

use super::defaults::builder_with_defaults;
use super::sources::{add_file_layers, global_config_path};
use super::SessionConfig;
use crate::error::SessionError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides, e.g. `GRAPH_SESSION__APP__APP_ID`.
pub const ENV_PREFIX: &str = "GRAPH_SESSION";

/// Loads [`SessionConfig`] from files and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{GRAPH_SESSION_ENV}.toml`, `GRAPH_SESSION__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<SessionConfig, SessionError> {
        let builder = add_file_layers(builder_with_defaults()?, workspace_root)
            .add_source(Self::environment());

        let config: SessionConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<SessionConfig, SessionError> {
        if !path.exists() {
            return Err(SessionError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: SessionConfig = builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Path of the user-level configuration file, if one can be determined.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_config_path()
    }

    /// Defaults only, without touching the filesystem or the environment.
    pub fn defaults() -> Result<SessionConfig, SessionError> {
        let config: SessionConfig = builder_with_defaults()?.build()?.try_deserialize()?;
        Ok(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
    }
}

