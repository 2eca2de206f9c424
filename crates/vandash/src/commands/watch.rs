//! `vandash watch`: stream level and battery readings as they are polled.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use vandash_core::{Dashboard, LevelSensorData, QueryState, QueryView, ShuntData};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::sensors;

/// One line of watch output.
#[derive(Debug, Serialize)]
struct WatchEvent {
    at: DateTime<Local>,
    device: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WatchEvent {
    fn line(&self, color: bool) -> String {
        let body = match (&self.summary, &self.error) {
            (Some(summary), _) => summary.clone(),
            (None, Some(err)) => output::failure(err, color),
            (None, None) => "-".into(),
        };
        format!("{} {:<8} {body}", self.at.format("%H:%M:%S"), self.device)
    }
}

fn to_event<T>(
    device: &'static str,
    state: &QueryState<T>,
    dashboard: &Dashboard,
    summarize: impl Fn(&T) -> String,
) -> Option<WatchEvent> {
    if state.is_fetching() {
        return None;
    }
    let (summary, error) = match state.view(dashboard.stale_policy(), false) {
        QueryView::Loading => return None,
        QueryView::Content { data, stale: false } => (Some(summarize(&data)), None),
        QueryView::Content { data, stale: true } => (
            Some(format!("{} (stale)", summarize(&data))),
            state.error.as_ref().map(vandash_core::CoreError::user_message),
        ),
        QueryView::Error(err) => (None, Some(err.user_message())),
    };
    Some(WatchEvent {
        at: Local::now(),
        device,
        summary,
        error,
    })
}

fn parse_interval(raw: &str) -> Result<Duration, CliError> {
    let period = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: "interval".into(),
        reason: e.to_string(),
    })?;
    if period < Duration::from_secs(1) {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1s".into(),
        });
    }
    Ok(period)
}

pub async fn handle(
    dashboard: &Dashboard,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // A custom period needs its own dashboard: poll periods are fixed per cache.
    let owned;
    let dashboard = match args.interval.as_deref() {
        Some(raw) => {
            let period = parse_interval(raw)?;
            let mut config = dashboard.config().clone();
            config.level_poll_interval = period;
            config.shunt_poll_interval = period;
            owned = Dashboard::new(config)?;
            &owned
        }
        None => dashboard,
    };

    let color = output::should_color(global.color);
    let mut level = dashboard.level_sensor();
    let mut battery = dashboard.battery();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!(
        level_every = ?dashboard.config().level_poll_interval,
        battery_every = ?dashboard.config().shunt_poll_interval,
        "watching sensors"
    );

    let mut printed = 0u32;
    loop {
        let next = tokio::select! {
            _ = &mut ctrl_c => break,
            state = level.changed() => match state {
                Some(state) => to_event("level", &state, dashboard, |s: &LevelSensorData| {
                    sensors::level_summary(s, color)
                }),
                None => break,
            },
            state = battery.changed() => match state {
                Some(state) => to_event("battery", &state, dashboard, |s: &ShuntData| {
                    sensors::battery_summary(s)
                }),
                None => break,
            },
        };
        let Some(event) = next else {
            continue;
        };

        let out = match global.output {
            OutputFormat::Table | OutputFormat::Plain => event.line(color),
            OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
                serde_json::to_string(&event).map_err(|e| CliError::Internal(e.to_string()))?
            }
        };
        output::print_output(&out, global.quiet);

        printed += 1;
        if args.count.is_some_and(|n| printed >= n) {
            break;
        }
    }
    Ok(())
}
