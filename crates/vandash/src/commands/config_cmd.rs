//! Config subcommand handlers.

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Config as TOML-ish text for the table view.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = write!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out, "\n");
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = write!(out, "url = \"{}\"", p.url);
        if let Some(ref ca) = p.ca_cert {
            let _ = write!(out, "\nca_cert = \"{}\"", ca.display());
        }
        let tuning = [
            ("insecure", p.insecure.map(|b| b.to_string())),
            ("timeout", p.timeout.map(|v| v.to_string())),
            ("led_debounce_ms", p.led_debounce_ms.map(|v| v.to_string())),
            ("toast_secs", p.toast_secs.map(|v| v.to_string())),
            ("level_poll_secs", p.level_poll_secs.map(|v| v.to_string())),
            ("shunt_poll_secs", p.shunt_poll_secs.map(|v| v.to_string())),
            (
                "stale_tolerance_secs",
                p.stale_tolerance_secs.map(|v| v.to_string()),
            ),
            ("slideshow_secs", p.slideshow_secs.map(|v| v.to_string())),
        ];
        for (key, value) in tuning {
            if let Some(value) = value {
                let _ = write!(out, "\n{key} = {value}");
            }
        }
    }

    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("vandash configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Dashboard backend URL")
                .default("http://localhost:5000".into())
                .validate_with(|raw: &String| {
                    config::parse_url(raw).map(|_| ()).map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            // Keep other profiles; this one becomes the default.
            let mut cfg = config::load_config_or_default();
            cfg.profiles
                .insert(profile_name.clone(), Profile::new(url.trim()));
            cfg.default_profile = Some(profile_name.clone());

            let written = config::save_config(&cfg)?;
            eprintln!("\n✓ Configuration written to {}", written.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: vandash status");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(global.output, &cfg, format_config, |c| {
                config::active_profile_name(global, c)
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
