//! Configuration layer: typed settings with layered precedence (file → env).

use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::render::Dialect;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "croccante";
const ENV_PREFIX: &str = "CROCCANTE";

pub(crate) const DEFAULT_ALLOW_UNSAFE_HTML: bool = true;
pub(crate) const DEFAULT_CONTAINER_CLASS: &str = "markdown-body";
pub(crate) const DEFAULT_CACHE_ENABLED: bool = true;
pub(crate) const DEFAULT_CACHE_TTL_SECONDS: u64 = 86_400;
pub(crate) const DEFAULT_CACHE_KEY_PREFIX: &str = "croccante_md";
pub(crate) const DEFAULT_CACHE_MEMORY_ENTRY_LIMIT: usize = 1024;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub dialect: Dialect,
    pub allow_unsafe_html: bool,
    pub container_class: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub key_prefix: String,
    pub memory_entry_limit: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment).
///
/// Both config files are optional; a missing file simply contributes nothing.
/// Environment variables use the `CROCCANTE` prefix with `__` as the section
/// separator, e.g. `CROCCANTE__CACHE__TTL_SECONDS=3600`.
pub fn load() -> Result<Settings, LoadError> {
    let builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    dialect: Option<String>,
    allow_unsafe_html: Option<bool>,
    container_class: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    key_prefix: Option<String>,
    memory_entry_limit: Option<usize>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            render,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self {
            logging,
            render,
            cache,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let dialect = match render.dialect {
        Some(name) => Dialect::from_str(name.as_str()).map_err(|()| {
            LoadError::invalid(
                "render.dialect",
                format!("unrecognized dialect `{name}`, expected `basic` or `extended`"),
            )
        })?,
        None => Dialect::default(),
    };

    let allow_unsafe_html = render.allow_unsafe_html.unwrap_or(DEFAULT_ALLOW_UNSAFE_HTML);

    let container_class = render
        .container_class
        .unwrap_or_else(|| DEFAULT_CONTAINER_CLASS.to_string());
    crate::cache::validate_container_class(&container_class)
        .map_err(|err| LoadError::invalid("render.container_class", err.to_string()))?;

    Ok(RenderSettings {
        dialect,
        allow_unsafe_html,
        container_class,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let enabled = cache.enabled.unwrap_or(DEFAULT_CACHE_ENABLED);
    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS);

    let key_prefix = cache
        .key_prefix
        .unwrap_or_else(|| DEFAULT_CACHE_KEY_PREFIX.to_string());
    crate::cache::validate_key_prefix(&key_prefix)
        .map_err(|err| LoadError::invalid("cache.key_prefix", err.to_string()))?;

    let memory_entry_limit = cache
        .memory_entry_limit
        .unwrap_or(DEFAULT_CACHE_MEMORY_ENTRY_LIMIT);
    if memory_entry_limit == 0 {
        return Err(LoadError::invalid(
            "cache.memory_entry_limit",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enabled,
        ttl_seconds,
        key_prefix,
        memory_entry_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_any_source() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
        assert_eq!(settings.render.dialect, Dialect::Extended);
        assert!(settings.render.allow_unsafe_html);
        assert_eq!(settings.render.container_class, "markdown-body");
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.ttl_seconds, 86_400);
        assert_eq!(settings.cache.key_prefix, "croccante_md");
        assert_eq!(settings.cache.memory_entry_limit, 1024);
    }

    #[test]
    fn settings_feed_subsystem_configs() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        let renderer_config = crate::cache::RendererConfig::from(&settings);
        assert_eq!(renderer_config.container_class, settings.render.container_class);
        assert_eq!(renderer_config.cache.key_prefix, settings.cache.key_prefix);
        assert_eq!(renderer_config.cache.ttl_seconds, settings.cache.ttl_seconds);

        let converter_config = crate::render::ConverterConfig::from(&settings.render);
        assert_eq!(converter_config.dialect, settings.render.dialect);
        assert_eq!(
            converter_config.allow_unsafe_html,
            settings.render.allow_unsafe_html
        );
    }

    #[test]
    fn json_flag_switches_log_format() {
        let raw = RawSettings {
            logging: RawLoggingSettings {
                json: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn bogus_log_level_is_rejected() {
        let raw = RawSettings {
            logging: RawLoggingSettings {
                level: Some("chatty".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Settings::from_raw(raw).expect_err("level should be rejected");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn dialect_name_selects_profile() {
        let raw = RawSettings {
            render: RawRenderSettings {
                dialect: Some("basic".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.render.dialect, Dialect::Basic);
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let raw = RawSettings {
            render: RawRenderSettings {
                dialect: Some("wiki".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Settings::from_raw(raw).expect_err("dialect should be rejected");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "render.dialect",
                ..
            }
        ));
    }

    #[test]
    fn key_prefix_ending_in_separator_is_rejected() {
        let raw = RawSettings {
            cache: RawCacheSettings {
                key_prefix: Some("notes_".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Settings::from_raw(raw).expect_err("prefix should be rejected");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.key_prefix",
                ..
            }
        ));
    }

    #[test]
    fn zero_entry_limit_is_rejected() {
        let raw = RawSettings {
            cache: RawCacheSettings {
                memory_entry_limit: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Settings::from_raw(raw).expect_err("limit should be rejected");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.memory_entry_limit",
                ..
            }
        ));
    }

    #[test]
    fn container_class_with_markup_is_rejected() {
        let raw = RawSettings {
            render: RawRenderSettings {
                container_class: Some("md\"><script>".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = Settings::from_raw(raw).expect_err("class should be rejected");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "render.container_class",
                ..
            }
        ));
    }
}
