//! `vandash status`: one read of every device.

use serde::Serialize;
use tabled::Tabled;

use vandash_core::{
    CoreError, Dashboard, DashboardSnapshot, InverterStatus, LedStatus, LevelSensorData,
    ShuntData,
};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::sensors;

// ── Report shape ────────────────────────────────────────────────────

/// One resource's read: its data, or why it failed.
#[derive(Serialize)]
struct Section<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> From<Result<T, CoreError>> for Section<T> {
    fn from(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.user_message()),
            },
        }
    }
}

#[derive(Serialize)]
struct StatusReport {
    inverter: Section<InverterStatus>,
    leds: Section<LedStatus>,
    level: Section<LevelSensorData>,
    battery: Section<ShuntData>,
}

impl From<DashboardSnapshot> for StatusReport {
    fn from(s: DashboardSnapshot) -> Self {
        Self {
            inverter: s.inverter.into(),
            leds: s.leds.into(),
            level: s.level.into(),
            battery: s.battery.into(),
        }
    }
}

impl StatusReport {
    fn failures(&self) -> usize {
        [
            self.inverter.error.is_some(),
            self.leds.error.is_some(),
            self.level.error.is_some(),
            self.battery.error.is_some(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Device")]
    device: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

fn row<T>(
    device: &'static str,
    section: &Section<T>,
    color: bool,
    f: impl Fn(&T) -> String,
) -> StatusRow {
    let state = match (&section.data, &section.error) {
        (Some(data), _) => f(data),
        (None, Some(err)) => output::failure(err, color),
        (None, None) => "-".into(),
    };
    StatusRow { device, state }
}

fn rows(report: &StatusReport, color: bool) -> Vec<StatusRow> {
    vec![
        row("Inverter", &report.inverter, color, |s| output::on_off(s.on, color)),
        row("LEDs", &report.leds, color, |s| leds_summary(s, color)),
        row("Level", &report.level, color, |s| sensors::level_summary(s, color)),
        row("Battery", &report.battery, color, sensors::battery_summary),
    ]
}

fn leds_summary(s: &LedStatus, color: bool) -> String {
    let power = s
        .is_on()
        .map_or_else(|| "unknown".into(), |on| output::on_off(on, color));
    let mut parts = vec![power];
    if let Some(b) = s.brightness {
        parts.push(format!("{b}%"));
    }
    if let Some(c) = s.color {
        parts.push(format!("rgb({c})"));
    }
    if let Some(p) = s.preset {
        parts.push(p.to_string());
    }
    parts.join(", ")
}

fn plain(report: &StatusReport) -> String {
    let line = |name: &str, ok: bool| format!("{name}\t{}", if ok { "ok" } else { "error" });
    [
        line("inverter", report.inverter.data.is_some()),
        line("leds", report.leds.data.is_some()),
        line("level", report.level.data.is_some()),
        line("battery", report.battery.data.is_some()),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = dashboard.snapshot().await;
    // Every read failing at transport level means the backend is down.
    let unreachable = [
        snapshot.inverter.as_ref().err(),
        snapshot.leds.as_ref().err(),
        snapshot.level.as_ref().err(),
        snapshot.battery.as_ref().err(),
    ]
    .into_iter()
    .all(|e| e.is_some_and(CoreError::is_transport))
    .then(|| snapshot.inverter.clone().err())
    .flatten();
    if let Some(err) = unreachable {
        return Err(err.into());
    }

    let report = StatusReport::from(snapshot);
    let color = output::should_color(global.color);
    let out = if global.output == OutputFormat::Table {
        output::render_table(&rows(&report, color))
    } else {
        output::render_single(global.output, &report, |_| String::new(), plain)
    };
    output::print_output(&out, global.quiet);

    if report.failures() > 0 {
        tracing::warn!(failed = report.failures(), "some devices could not be read");
    }
    Ok(())
}
