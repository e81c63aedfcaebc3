//! `stardeck-config`: StarDeck runtime configuration.
//!
//! Provides:
//! - Typed config schema (`stardeck.yaml`, camelCase keys)
//! - YAML loading with a config-directory lookup
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, resolve_config_path};
pub use schema::StarDeckConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, apply env substitution, apply defaults and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Warnings
/// are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<StarDeckConfig> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: StarDeckConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);
    check(&config)?;
    Ok(config)
}

/// Validate an already-assembled config, logging the report.
pub fn check(config: &StarDeckConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }
    Ok(())
}
