//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    collections::BTreeSet,
    num::NonZeroUsize,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::access::UnscopedPolicy;
use crate::domain::types::ContentKind;

mod cli;

pub use cli::{
    ActionsArgs, CanEditArgs, CliArgs, Command, EditableArgs, ManagerEmailArgs, RosterArgs,
    SettingsOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rostergate";
const DEFAULT_CACHE_MAX_ENTRIES: usize = 2_000;
const DEFAULT_CACHE_STORE_TIMEOUT_MS: u64 = 250;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Longest TTL allowed when the store cannot delete by prefix.
const MAX_TTL_WITHOUT_PATTERN_DELETE_SECS: u64 = 300;
const DEFAULT_BOOKING_EMAIL: &str = "booking@rostergate.example";
const DEFAULT_BOOKING_LOOKUP_TTL_SECS: u64 = 300;
const DEFAULT_HIDDEN_ACTIONS: [&str; 2] = ["publish", "unpublish"];

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub access: AccessSettings,
    pub booking: BookingSettings,
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
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: NonZeroUsize,
    pub store_timeout: Duration,
    pub default_ttl: Duration,
    pub pattern_delete: bool,
    pub key_prefix: String,
}

#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub unscoped_policy: UnscopedPolicy,
    pub restricted_creation: BTreeSet<ContentKind>,
    pub hidden_actions: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub default_email: String,
    pub lookup_ttl: Duration,
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

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("ROSTERGATE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.command.roster().overrides);

    Settings::from_raw(raw)
}

/// Parse the process arguments and resolve configuration from them.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    access: RawAccessSettings,
    booking: RawBookingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(policy) = overrides.unscoped_policy.as_ref() {
            self.access.unscoped_policy = Some(policy.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            access,
            booking,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            access: build_access_settings(access)?,
            booking: build_booking_settings(booking)?,
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

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let max_entries = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    let max_entries = NonZeroUsize::new(max_entries)
        .ok_or_else(|| LoadError::invalid("cache.max_entries", "must be greater than zero"))?;

    let timeout_ms = cache
        .store_timeout_ms
        .unwrap_or(DEFAULT_CACHE_STORE_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.store_timeout_ms",
            "must be greater than zero",
        ));
    }

    let ttl_secs = cache.default_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.default_ttl_secs",
            "must be greater than zero",
        ));
    }

    let pattern_delete = cache.pattern_delete.unwrap_or(true);
    if !pattern_delete && ttl_secs > MAX_TTL_WITHOUT_PATTERN_DELETE_SECS {
        return Err(LoadError::invalid(
            "cache.default_ttl_secs",
            format!(
                "must not exceed {MAX_TTL_WITHOUT_PATTERN_DELETE_SECS} when pattern_delete is off"
            ),
        ));
    }

    let key_prefix = cache.key_prefix.unwrap_or_default().trim().to_string();

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        max_entries,
        store_timeout: Duration::from_millis(timeout_ms),
        default_ttl: Duration::from_secs(ttl_secs),
        pattern_delete,
        key_prefix,
    })
}

fn build_access_settings(access: RawAccessSettings) -> Result<AccessSettings, LoadError> {
    let unscoped_policy = match access.unscoped_policy {
        Some(value) => UnscopedPolicy::from_str(&value)
            .map_err(|err| LoadError::invalid("access.unscoped_policy", err.to_string()))?,
        None => UnscopedPolicy::default(),
    };

    let restricted_creation = match access.restricted_creation {
        Some(kinds) => kinds
            .iter()
            .map(|kind| ContentKind::from_str(kind))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| LoadError::invalid("access.restricted_creation", err.to_string()))?,
        None => BTreeSet::from([ContentKind::Artist]),
    };

    let hidden_actions = match access.hidden_actions {
        Some(actions) => {
            let trimmed: BTreeSet<String> = actions
                .iter()
                .map(|action| action.trim().to_string())
                .collect();
            if trimmed.iter().any(String::is_empty) {
                return Err(LoadError::invalid(
                    "access.hidden_actions",
                    "action names must not be blank",
                ));
            }
            trimmed
        }
        None => DEFAULT_HIDDEN_ACTIONS.into_iter().map(str::to_string).collect(),
    };

    Ok(AccessSettings {
        unscoped_policy,
        restricted_creation,
        hidden_actions,
    })
}

fn build_booking_settings(booking: RawBookingSettings) -> Result<BookingSettings, LoadError> {
    let default_email = booking
        .default_email
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BOOKING_EMAIL.to_string());
    if !default_email.contains('@') {
        return Err(LoadError::invalid(
            "booking.default_email",
            "must be an email address",
        ));
    }

    let ttl_secs = booking
        .lookup_ttl_secs
        .unwrap_or(DEFAULT_BOOKING_LOOKUP_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "booking.lookup_ttl_secs",
            "must be greater than zero",
        ));
    }

    Ok(BookingSettings {
        default_email,
        lookup_ttl: Duration::from_secs(ttl_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    max_entries: Option<usize>,
    store_timeout_ms: Option<u64>,
    default_ttl_secs: Option<u64>,
    pattern_delete: Option<bool>,
    key_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAccessSettings {
    unscoped_policy: Option<String>,
    restricted_creation: Option<Vec<String>>,
    hidden_actions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBookingSettings {
    default_email: Option<String>,
    lookup_ttl_secs: Option<u64>,
}
