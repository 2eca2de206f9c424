//! CLI configuration: thin wrapper around `vandash_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--url`, `--timeout`, `--insecure`).

use std::time::Duration;

use vandash_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vandash_config::{
    Config, Profile, config_path, load_config, load_config_or_default, parse_url, save_config,
};

/// Active profile name: `--profile`, else the config's default.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `DashboardConfig` for this invocation.
///
/// A profile supplies the base values; `--url` alone is enough when no
/// profile exists. Flags win over profile values.
pub fn resolve(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config()?;
    let name = active_profile_name(global, &cfg);

    let mut dashboard = match (cfg.profiles.get(&name), global.url.as_deref()) {
        (Some(profile), _) => {
            let mut profile = profile.clone();
            if let Some(url) = global.url.as_deref() {
                url.clone_into(&mut profile.url);
            }
            vandash_config::profile_to_dashboard_config(&profile, &cfg.defaults)?
        }
        (None, Some(url)) => {
            let mut dashboard = DashboardConfig::new(parse_url(url)?);
            dashboard.timeout = Duration::from_secs(cfg.defaults.timeout);
            if cfg.defaults.insecure {
                dashboard.tls = TlsVerification::DangerAcceptInvalid;
            }
            dashboard
        }
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        dashboard.timeout = Duration::from_secs(secs);
    }
    if global.insecure {
        dashboard.tls = TlsVerification::DangerAcceptInvalid;
    }

    tracing::debug!(profile = %name, url = %dashboard.url, "resolved backend");
    Ok(dashboard)
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
