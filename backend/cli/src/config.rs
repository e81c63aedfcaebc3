use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use stardeck_config::{validation::MIN_TOKEN_LEN, StarDeckConfig};
use stardeck_gateway::{PresenterToken, ReloadPolicy};
use stardeck_logging::LogOptions;
use stardeck_markdown::RenderMode;

use crate::ServeArgs;

/// Settings for `stardeck serve`: command-line flags over the config file
/// over built-in defaults.
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub host: String,
    pub port: u16,
    pub token: PresenterToken,
    /// True when no token was configured and one was generated.
    pub token_generated: bool,
    pub mode: RenderMode,
    pub reload_policy: ReloadPolicy,
    pub subscriber_buffer: usize,
    pub log: LogOptions,
}

impl ServeSettings {
    pub fn merge(config: &StarDeckConfig, args: &ServeArgs) -> Result<Self> {
        let (token, token_generated) = match args.token.clone().or_else(|| config.presenter_token()) {
            Some(token) if token.len() < MIN_TOKEN_LEN => {
                bail!("Presenter token must be at least {MIN_TOKEN_LEN} characters")
            }
            Some(token) => (PresenterToken::new(token), false),
            None => (PresenterToken::generate(), true),
        };

        let mode = if args.motion {
            RenderMode::Motion
        } else {
            RenderMode::from_str(&config.render_mode()).map_err(|e| anyhow!(e))?
        };

        Ok(Self {
            host: args.host.clone().unwrap_or_else(|| config.host()),
            port: args.port.unwrap_or_else(|| config.port()),
            token,
            token_generated,
            mode,
            reload_policy: ReloadPolicy::from_str(&config.reload_policy()).map_err(|e| anyhow!(e))?,
            subscriber_buffer: config.subscriber_buffer(),
            log: LogOptions {
                level: config.log_level(),
                json: config.log_json(),
                dir: config.log_dir().map(PathBuf::from),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_config::apply_all_defaults;
    use stardeck_config::schema::{PresenterConfig, RenderConfig, ServerConfig, SyncConfig};

    fn args() -> ServeArgs {
        ServeArgs {
            slides: PathBuf::from("slides.md"),
            port: None,
            host: None,
            motion: false,
            watch: false,
            token: None,
            config: None,
        }
    }

    #[test]
    fn defaults_generate_a_token() {
        let settings = ServeSettings::merge(&apply_all_defaults(StarDeckConfig::default()), &args()).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 5001);
        assert!(settings.token_generated);
        assert!(settings.token.as_str().starts_with("sd_"));
        assert_eq!(settings.mode, RenderMode::Css);
        assert_eq!(settings.reload_policy, ReloadPolicy::Reset);
    }

    #[test]
    fn flags_override_config() {
        let config = apply_all_defaults(StarDeckConfig {
            server: Some(ServerConfig {
                host: Some("0.0.0.0".into()),
                port: Some(7000),
            }),
            presenter: Some(PresenterConfig {
                token: Some("from-config".into()),
            }),
            render: Some(RenderConfig {
                mode: Some("css".into()),
            }),
            sync: Some(SyncConfig {
                subscriber_buffer: Some(8),
                reload_policy: Some("clamp".into()),
            }),
            ..Default::default()
        });
        let settings = ServeSettings::merge(
            &config,
            &ServeArgs {
                port: Some(9000),
                motion: true,
                token: Some("from-flag-1".into()),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.token.as_str(), "from-flag-1");
        assert!(!settings.token_generated);
        assert_eq!(settings.mode, RenderMode::Motion);
        assert_eq!(settings.reload_policy, ReloadPolicy::Clamp);
        assert_eq!(settings.subscriber_buffer, 8);
    }

    #[test]
    fn short_flag_token_is_rejected() {
        let config = apply_all_defaults(StarDeckConfig::default());
        let err = ServeSettings::merge(&config, &ServeArgs { token: Some("abc".into()), ..args() }).unwrap_err();
        assert!(err.to_string().contains("at least"));
    }
}
