//! LED strip command handlers.
//!
//! `set` goes through the same LED panel the dashboard uses: seed from the
//! current status, apply the edits, and wait for the debounced configure
//! request to settle.

use std::time::Duration;

use vandash_core::{
    CommandResult, Dashboard, LedPreset, LedSettings, LedStatus, Rgb, SleepTimer, ToastStatus,
};

use crate::cli::{GlobalOpts, LedSetArgs, LedsArgs, LedsCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &LedStatus, color: bool) -> String {
    let mut lines = vec![format!(
        "Power:      {}",
        s.is_on()
            .map_or_else(|| "unknown".into(), |on| output::on_off(on, color))
    )];
    if let Some(b) = s.brightness {
        lines.push(format!("Brightness: {b}%"));
    }
    if let Some(c) = s.color {
        lines.push(format!("Color:      {c}"));
    }
    lines.push(format!(
        "Preset:     {}",
        s.preset.map_or_else(|| "none".into(), |p| p.to_string())
    ));
    lines.join("\n")
}

fn power_word(s: &LedStatus) -> String {
    match s.is_on() {
        Some(true) => "on".into(),
        Some(false) => "off".into(),
        None => "unknown".into(),
    }
}

/// Parsed `leds set` flags; `None` leaves a setting alone.
#[derive(Debug, Default, PartialEq)]
struct LedEdits {
    on: Option<bool>,
    brightness: Option<u8>,
    color: Option<Rgb>,
    preset: Option<Option<LedPreset>>,
    sleep: Option<SleepTimer>,
}

impl LedEdits {
    fn parse(args: &LedSetArgs) -> Result<Self, CliError> {
        let invalid = |field: &str| {
            let field = field.to_owned();
            move |reason: String| CliError::Validation { field, reason }
        };

        let on = if args.on {
            Some(true)
        } else if args.off {
            Some(false)
        } else {
            None
        };
        let color = args
            .color
            .as_deref()
            .map(str::parse::<Rgb>)
            .transpose()
            .map_err(invalid("color"))?;
        let preset = match args.preset.as_deref() {
            None => None,
            Some("none" | "off") => Some(None),
            Some(p) => Some(Some(p.parse::<LedPreset>().map_err(|_| {
                CliError::Validation {
                    field: "preset".into(),
                    reason: format!("unknown preset '{p}' (expected rainbow, chase, pulse or none)"),
                }
            })?)),
        };
        let sleep = args
            .sleep
            .as_deref()
            .map(str::parse::<SleepTimer>)
            .transpose()
            .map_err(invalid("sleep"))?;

        let edits = Self {
            on,
            brightness: args.brightness,
            color,
            preset,
            sleep,
        };
        if edits == Self::default() {
            return Err(CliError::Validation {
                field: "leds set".into(),
                reason: "nothing to change; pass --on, --off, --brightness, --color, --preset or --sleep"
                    .into(),
            });
        }
        Ok(edits)
    }

    fn apply(&self, s: &mut LedSettings) {
        if let Some(on) = self.on {
            s.on = on;
        }
        if let Some(b) = self.brightness {
            s.brightness = b;
        }
        if let Some(c) = self.color {
            s.color = c;
        }
        if let Some(p) = self.preset {
            s.preset = p;
        }
        if let Some(t) = self.sleep {
            s.sleep = t;
        }
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: LedsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        LedsCommand::Status => {
            let leds = dashboard.leds();
            leds.ready().await?;
            let Some(status) = leds.status().data() else {
                return Err(CliError::Internal("no LED status received".into()));
            };
            let out = output::render_single(
                global.output,
                status.as_ref(),
                |s| detail(s, color),
                power_word,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LedsCommand::Set(set) => {
            let edits = LedEdits::parse(&set)?;
            let leds = dashboard.leds();
            let before = leds.ready().await?;

            let mut results = leds.mutations();
            leds.edit(|s| edits.apply(s));
            if leds.settings().as_ref() == Some(&before) {
                output::notice("LEDs already match; nothing sent", global.quiet);
                return Ok(());
            }

            // Debounce delay plus the request timeout bounds the wait.
            let limit = dashboard.config().led_debounce + dashboard.config().timeout;
            tokio::time::timeout(limit + Duration::from_secs(1), results.changed())
                .await
                .map_err(|_| CliError::Timeout {
                    url: dashboard.config().url.to_string(),
                })?
                .map_err(|_| CliError::Internal("LED panel closed".into()))?;

            let settled = results.borrow_and_update().clone();
            let Some(settled) = settled else {
                return Err(CliError::Internal("no LED result".into()));
            };
            let status = match settled.into_result()? {
                CommandResult::Leds(status) => status,
                other => {
                    return Err(CliError::Internal(format!("unexpected result {other:?}")));
                }
            };

            let toast = dashboard.toaster().current();
            if let (Some(message), ToastStatus::Error) = (&toast.message, toast.status) {
                return Err(CliError::Rejected {
                    message: message.clone(),
                });
            }
            if let Some(message) = toast.message {
                output::notice(&message, global.quiet);
            }

            let out = output::render_single(
                global.output,
                &status,
                |s| detail(s, color),
                power_word,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LedSetArgs {
        LedSetArgs {
            on: false,
            off: false,
            brightness: None,
            color: None,
            preset: None,
            sleep: None,
        }
    }

    #[test]
    fn no_flags_is_a_usage_error() {
        assert!(matches!(
            LedEdits::parse(&args()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn flags_apply_only_what_was_given() {
        let edits = LedEdits::parse(&LedSetArgs {
            on: true,
            color: Some("#ff8000".into()),
            preset: Some("none".into()),
            sleep: Some("30m".into()),
            ..args()
        })
        .ok();
        let Some(edits) = edits else {
            panic!("flags should parse");
        };

        let mut settings = LedSettings {
            preset: Some(LedPreset::Rainbow),
            ..LedSettings::default()
        };
        edits.apply(&mut settings);
        assert!(settings.on);
        assert_eq!(settings.brightness, 50);
        assert_eq!(settings.color, Rgb::new(255, 128, 0));
        assert_eq!(settings.preset, None);
        assert_eq!(settings.sleep, SleepTimer::ThirtyMinutes);
    }

    #[test]
    fn bad_values_name_their_flag() {
        let err = LedEdits::parse(&LedSetArgs {
            preset: Some("disco".into()),
            ..args()
        });
        assert!(matches!(err, Err(CliError::Validation { ref field, .. }) if field == "preset"));

        let err = LedEdits::parse(&LedSetArgs {
            color: Some("1,2".into()),
            ..args()
        });
        assert!(matches!(err, Err(CliError::Validation { ref field, .. }) if field == "color"));
    }
}
