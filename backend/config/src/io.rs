//! Config file location and loading.

use crate::schema::StarDeckConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "stardeck.yaml";

/// Resolve the StarDeck config directory.
/// Priority: `STARDECK_CONFIG_DIR` env > `~/.stardeck/` > `./.stardeck`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STARDECK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".stardeck"),
        None => PathBuf::from(".stardeck"),
    }
}

/// Resolve the full path to the config file inside a config directory.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// The config file to use: an explicit path wins over the config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path(&config_dir()),
    }
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<StarDeckConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(StarDeckConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(StarDeckConfig::default());
    }

    let config: StarDeckConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
