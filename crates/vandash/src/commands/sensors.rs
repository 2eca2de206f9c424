//! `vandash level` and `vandash battery`.

use std::sync::Arc;

use vandash_core::{
    Dashboard, LevelSensorData, QuerySubscription, QueryView, ShuntData, StalePolicy,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Formatting ──────────────────────────────────────────────────────

pub fn level_summary(s: &LevelSensorData, color: bool) -> String {
    format!(
        "{} level, pitch {:.1}° ({}), roll {:.1}° ({})",
        percent(&s.level_percent.to_string()),
        s.pitch,
        output::rating(s.pitch_rating, color),
        s.roll,
        output::rating(s.roll_rating, color),
    )
}

pub fn level_detail(s: &LevelSensorData, color: bool) -> String {
    [
        format!("Level:  {}", percent(&s.level_percent.to_string())),
        format!("Pitch:  {:.1}° ({})", s.pitch, output::rating(s.pitch_rating, color)),
        format!("Roll:   {:.1}° ({})", s.roll, output::rating(s.roll_rating, color)),
    ]
    .join("\n")
}

pub fn battery_summary(s: &ShuntData) -> String {
    format!(
        "{} charged, {:.2} V, {:.2} A, {:.1} W",
        percent(&s.state_of_charge_percent.to_string()),
        s.voltage,
        s.current,
        s.power,
    )
}

pub fn battery_detail(s: &ShuntData) -> String {
    let mut lines = vec![
        format!("Charge:    {}", percent(&s.state_of_charge_percent.to_string())),
        format!("Voltage:   {:.2} V", s.voltage),
        format!("Current:   {:.2} A", s.current),
        format!("Power:     {:.1} W", s.power),
    ];
    if let Some(ah) = s.consumed_ah {
        lines.push(format!("Consumed:  {ah:.1} Ah"));
    }
    let remaining = s.time_to_go_min.to_string();
    if !remaining.is_empty() {
        lines.push(format!("Remaining: {remaining}"));
    }
    lines.join("\n")
}

/// Readings arrive as `80` or `"80%"`; show both as `80%`.
fn percent(raw: &str) -> String {
    if raw.is_empty() || raw.ends_with('%') {
        raw.to_owned()
    } else {
        format!("{raw}%")
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// Wait for a subscription's first settled read.
async fn read_once<T: Send + Sync + 'static>(
    mut sub: QuerySubscription<T>,
) -> Result<Arc<T>, CliError> {
    let state = sub.settled().await;
    match state.view(StalePolicy::strict(), false) {
        QueryView::Content { data, .. } => Ok(data),
        QueryView::Error(err) => Err(err.into()),
        QueryView::Loading => Err(CliError::Internal("no reading received".into())),
    }
}

pub async fn level(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let data = read_once(dashboard.level_sensor()).await?;
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        data.as_ref(),
        |s| level_detail(s, color),
        |s| s.level_percent.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn battery(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let data = read_once(dashboard.battery()).await?;
    let out = output::render_single(
        global.output,
        data.as_ref(),
        battery_detail,
        |s| s.state_of_charge_percent.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
