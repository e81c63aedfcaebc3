//! Config validation: checks with user-friendly error messages.

use crate::schema::StarDeckConfig;
use thiserror::Error;

/// Presenter tokens shorter than this are rejected.
pub const MIN_TOKEN_LEN: usize = 8;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &StarDeckConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_presenter(config, &mut report);
    validate_sync(config, &mut report);
    validate_render(config, &mut report);
    report
}

fn validate_server(config: &StarDeckConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if let Some(host) = &server.host {
        if host.trim().is_empty() {
            report.error("server.host", "Host cannot be empty");
        }
    }
    if let Some(port) = server.port {
        if port != 0 && port < 1024 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
}

fn validate_presenter(config: &StarDeckConfig, report: &mut ValidationReport) {
    let Some(token) = config.presenter_token() else { return };
    if token.len() < MIN_TOKEN_LEN {
        report.error(
            "presenter.token",
            format!("Presenter token must be at least {MIN_TOKEN_LEN} characters"),
        );
    }
    if token.chars().any(char::is_whitespace) {
        report.error("presenter.token", "Presenter token cannot contain whitespace");
    }
}

fn validate_sync(config: &StarDeckConfig, report: &mut ValidationReport) {
    let Some(sync) = &config.sync else { return };
    if sync.subscriber_buffer == Some(0) {
        report.error("sync.subscriberBuffer", "subscriberBuffer must be >= 1");
    }
    if let Some(policy) = &sync.reload_policy {
        if !matches!(policy.as_str(), "reset" | "clamp") {
            report.error(
                "sync.reloadPolicy",
                format!("Unknown reload policy '{policy}'. Use 'reset' or 'clamp'"),
            );
        }
    }
}

fn validate_render(config: &StarDeckConfig, report: &mut ValidationReport) {
    let Some(render) = &config.render else { return };
    if let Some(mode) = &render.mode {
        if !matches!(mode.as_str(), "css" | "motion") {
            report.error(
                "render.mode",
                format!("Unknown render mode '{mode}'. Use 'css' or 'motion'"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{PresenterConfig, RenderConfig, ServerConfig, SyncConfig};

    #[test]
    fn defaults_are_valid() {
        let report = validate(&apply_all_defaults(StarDeckConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_buffer_and_unknown_policy_are_errors() {
        let cfg = StarDeckConfig {
            sync: Some(SyncConfig {
                subscriber_buffer: Some(0),
                reload_policy: Some("rewind".into()),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["sync.subscriberBuffer", "sync.reloadPolicy"]);
    }

    #[test]
    fn unknown_render_mode_is_error() {
        let cfg = StarDeckConfig {
            render: Some(RenderConfig {
                mode: Some("flash".into()),
            }),
            ..Default::default()
        };
        assert!(!validate(&cfg).is_valid());
    }

    #[test]
    fn short_token_is_error() {
        let cfg = StarDeckConfig {
            presenter: Some(PresenterConfig {
                token: Some("abc".into()),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors[0].path, "presenter.token");
    }

    #[test]
    fn privileged_port_is_warning() {
        let cfg = StarDeckConfig {
            server: Some(ServerConfig {
                host: None,
                port: Some(80),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "server.port");
    }
}
