//! StarDeck runtime configuration schema.
//!
//! Every field is optional so a partial `stardeck.yaml` deserializes;
//! [`crate::defaults::apply_all_defaults`] fills the gaps and the accessor
//! methods below read the effective values.

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_RELOAD_POLICY, DEFAULT_RENDER_MODE,
    DEFAULT_SUBSCRIBER_BUFFER,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarDeckConfig {
    /// HTTP listener
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Presenter capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter: Option<PresenterConfig>,

    /// Subscriber fan-out and reload behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,

    /// Slide rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenterConfig {
    /// Fixed presenter token. A fresh one is generated per run when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Outbound messages buffered per subscriber before backpressure applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_buffer: Option<usize>,
    /// `reset` or `clamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// `css` or `motion`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    /// Directory for rolling NDJSON log files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Effective values
// ---------------------------------------------------------------------------

impl StarDeckConfig {
    pub fn host(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn presenter_token(&self) -> Option<String> {
        self.presenter
            .as_ref()
            .and_then(|p| p.token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn subscriber_buffer(&self) -> usize {
        self.sync
            .as_ref()
            .and_then(|s| s.subscriber_buffer)
            .unwrap_or(DEFAULT_SUBSCRIBER_BUFFER)
    }

    pub fn reload_policy(&self) -> String {
        self.sync
            .as_ref()
            .and_then(|s| s.reload_policy.clone())
            .unwrap_or_else(|| DEFAULT_RELOAD_POLICY.to_string())
    }

    pub fn render_mode(&self) -> String {
        self.render
            .as_ref()
            .and_then(|r| r.mode.clone())
            .unwrap_or_else(|| DEFAULT_RENDER_MODE.to_string())
    }

    pub fn log_level(&self) -> String {
        self.logging
            .as_ref()
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_dir(&self) -> Option<String> {
        self.logging.as_ref().and_then(|l| l.dir.clone())
    }
}
