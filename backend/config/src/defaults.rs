//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{LoggingConfig, RenderConfig, ServerConfig, StarDeckConfig, SyncConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;
pub const DEFAULT_RELOAD_POLICY: &str = "reset";
pub const DEFAULT_RENDER_MODE: &str = "css";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: StarDeckConfig) -> StarDeckConfig {
    let config = apply_server_defaults(config);
    let config = apply_sync_defaults(config);
    let config = apply_render_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: StarDeckConfig) -> StarDeckConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.host.get_or_insert_with(|| DEFAULT_HOST.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    config
}

fn apply_sync_defaults(mut config: StarDeckConfig) -> StarDeckConfig {
    let sync = config.sync.get_or_insert_with(SyncConfig::default);
    sync.subscriber_buffer.get_or_insert(DEFAULT_SUBSCRIBER_BUFFER);
    sync.reload_policy
        .get_or_insert_with(|| DEFAULT_RELOAD_POLICY.to_string());
    config
}

fn apply_render_defaults(mut config: StarDeckConfig) -> StarDeckConfig {
    let render = config.render.get_or_insert_with(RenderConfig::default);
    render.mode.get_or_insert_with(|| DEFAULT_RENDER_MODE.to_string());
    config
}

fn apply_logging_defaults(mut config: StarDeckConfig) -> StarDeckConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
