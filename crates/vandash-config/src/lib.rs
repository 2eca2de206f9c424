//! Shared configuration for vandash front ends.
//!
//! TOML profiles (one per backend), loaded through figment with `VANDASH_`
//! environment overrides, and translated to `vandash_core::DashboardConfig`.
//! The CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vandash_core::{DashboardConfig, TlsVerification};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "VANDASH_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// One dashboard backend. Unset tuning fields keep the stock values.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g. "http://van.local:5000").
    pub url: String,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override the insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Quiet period before LED edits are sent, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_debounce_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toast_secs: Option<u64>,

    /// Level sensor polling period; 0 disables polling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_poll_secs: Option<u64>,

    /// Battery shunt polling period; 0 disables polling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shunt_poll_secs: Option<u64>,

    /// How long stale data is shown after a failed refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_tolerance_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slideshow_secs: Option<u64>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$VANDASH_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("dev", "vandash", "vandash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vandash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (a missing file just yields defaults) plus `VANDASH_`
/// environment overrides. Nested keys use `__`, e.g.
/// `VANDASH_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VANDASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a backend URL.
pub fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{other}' (expected http or https)"),
        }),
    }
}

/// Build a `DashboardConfig` from a profile and the global defaults.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let mut config = DashboardConfig::new(parse_url(&profile.url)?);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if config.timeout.is_zero() {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    if let Some(ms) = profile.led_debounce_ms {
        config.led_debounce = Duration::from_millis(ms);
    }
    if let Some(secs) = profile.toast_secs {
        config.toast_duration = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.level_poll_secs {
        config.level_poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.shunt_poll_secs {
        config.shunt_poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.stale_tolerance_secs {
        config.stale_tolerance = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.slideshow_secs {
        if secs == 0 {
            return Err(ConfigError::Validation {
                field: "slideshow_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        config.slideshow_interval = Duration::from_secs(secs);
    }

    Ok(config)
}
