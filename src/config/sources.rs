//! Configuration file layers, lowest precedence first.
//!
//! 1. `$XDG_CONFIG_HOME/graph-session/config.toml` (or `~/.config/...`)
//! 2. `<workspace>/config/config.toml`
//! 3. `<workspace>/config/{GRAPH_SESSION_ENV}.toml`, `development` when unset

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the environment-specific workspace file.
pub const ENV_VAR: &str = "GRAPH_SESSION_ENV";

const DEFAULT_ENV: &str = "development";
const APP_DIR: &str = "graph-session";
const FILE_NAME: &str = "config.toml";

/// User-level configuration file, if a home or XDG directory is known.
pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join(APP_DIR).join(FILE_NAME))
}

/// Candidate files in precedence order, whether or not they exist.
pub fn file_layers(workspace_root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    let config_dir = workspace_root.join("config");

    let mut layers: Vec<PathBuf> = global_config_path().into_iter().collect();
    layers.push(config_dir.join(FILE_NAME));
    layers.push(config_dir.join(format!("{}.toml", env_name)));
    layers
}

/// Add every existing layer to the builder.
pub fn add_file_layers(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    for path in file_layers(workspace_root) {
        if path.exists() {
            debug!(config_path = %path.display(), "Adding configuration file");
            builder = builder.add_source(File::from(path).required(false));
        }
    }
    builder
}
