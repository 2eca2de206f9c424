// ── LED strip controller ──
//
// Seeds an edit buffer from the first successful `GET /leds`, then owns
// it: later polls never touch the buffer. Every edit re-arms the debouncer
// with the full settings snapshot; when it fires, the snapshot is sent as
// a `POST /leds/configure` mutation that runs to completion even if the
// controller is dropped meanwhile (its toast is suppressed in that case).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vandash_api::{ApiClient, LedConfigureRequest, LedPreset, LedStatus, Rgb};

use crate::command::{Command, CommandResult};
use crate::control::EditBuffer;
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::mutation::{MutationHandle, MutationState};
use crate::query::QuerySubscription;
use crate::toast::Toaster;

// ── Settings ─────────────────────────────────────────────────────────

/// Sleep timer choices offered by the LED panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepTimer {
    #[default]
    Off,
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
}

impl SleepTimer {
    pub const ALL: [Self; 5] = [
        Self::Off,
        Self::FiveMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
    ];

    /// Value sent as `sleep` on the wire.
    pub fn as_millis(self) -> u64 {
        match self {
            Self::Off => 0,
            Self::FiveMinutes => 300_000,
            Self::ThirtyMinutes => 1_800_000,
            Self::OneHour => 3_600_000,
            Self::TwoHours => 7_200_000,
        }
    }

    pub fn from_millis(ms: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_millis() == ms)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "None",
            Self::FiveMinutes => "5 Minutes",
            Self::ThirtyMinutes => "30 Minutes",
            Self::OneHour => "1 Hour",
            Self::TwoHours => "2 Hours",
        }
    }
}

impl fmt::Display for SleepTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SleepTimer {
    type Err = String;

    /// Accepts `off`/`none`, or one of `5m`, `30m`, `1h`, `2h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "0" => Ok(Self::Off),
            "5m" | "5min" => Ok(Self::FiveMinutes),
            "30m" | "30min" => Ok(Self::ThirtyMinutes),
            "1h" | "60m" => Ok(Self::OneHour),
            "2h" | "120m" => Ok(Self::TwoHours),
            other => Err(format!(
                "unsupported sleep timer '{other}' (expected off, 5m, 30m, 1h or 2h)"
            )),
        }
    }
}

/// The LED panel's edit buffer contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedSettings {
    pub on: bool,
    /// 0..=100
    pub brightness: u8,
    pub color: Rgb,
    pub sleep: SleepTimer,
    pub preset: Option<LedPreset>,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            on: false,
            brightness: 50,
            color: Rgb::WHITE,
            sleep: SleepTimer::Off,
            preset: None,
        }
    }
}

impl LedSettings {
    /// Seed values from a status read. A zero brightness reads as unset.
    /// Sleep and preset always start cleared; the backend doesn't report
    /// a running sleep timer.
    pub fn from_status(status: &LedStatus) -> Self {
        let defaults = Self::default();
        Self {
            on: status.is_on().unwrap_or(defaults.on),
            brightness: status
                .brightness
                .filter(|b| *b > 0)
                .map_or(defaults.brightness, |b| b.min(100)),
            color: status.color.unwrap_or(defaults.color),
            ..defaults
        }
    }

    pub fn to_request(&self) -> LedConfigureRequest {
        LedConfigureRequest {
            on: Some(self.on),
            sleep: Some(self.sleep.as_millis()),
            brightness: Some(self.brightness),
            color: Some(self.color.to_wire()),
            preset: self.preset,
        }
    }
}

// ── Controller ───────────────────────────────────────────────────────

struct Shared {
    buffer: EditBuffer<LedSettings>,
    debouncer: Debouncer<LedSettings>,
}

impl Shared {
    fn seed(&self, status: &LedStatus) {
        let settings = LedSettings::from_status(status);
        if self.buffer.seed(settings.clone()) {
            info!(on = settings.on, brightness = settings.brightness, "LED controls ready");
            self.debouncer.prime(settings);
        }
    }
}

/// A mounted LED panel. Dropping it unmounts.
pub struct LedController {
    status: QuerySubscription<LedStatus>,
    shared: Arc<Shared>,
    mutations: Arc<watch::Sender<Option<MutationState>>>,
    unmounted: CancellationToken,
    seed_task: JoinHandle<()>,
}

impl LedController {
    pub fn mount(
        status: QuerySubscription<LedStatus>,
        client: ApiClient,
        toaster: Toaster,
        debounce: Duration,
    ) -> Self {
        let unmounted = CancellationToken::new();
        let (mutations, _) = watch::channel(None);
        let mutations = Arc::new(mutations);

        let on_fire = {
            let unmounted = unmounted.clone();
            let mutations = Arc::clone(&mutations);
            move |settings: LedSettings| {
                debug!(?settings, "sending LED settings");
                let handle = MutationHandle::spawn(
                    client.clone(),
                    Command::ConfigureLeds(settings.to_request()),
                );
                let toaster = toaster.clone();
                let unmounted = unmounted.clone();
                let mutations = Arc::clone(&mutations);
                tokio::spawn(async move {
                    let state = handle.settled().await;
                    if unmounted.is_cancelled() {
                        debug!(id = %state.id, "LED panel unmounted; toast suppressed");
                    } else {
                        report(&toaster, &settings, state.clone().into_result());
                    }
                    mutations.send_replace(Some(state));
                });
            }
        };

        let shared = Arc::new(Shared {
            buffer: EditBuffer::new(),
            debouncer: Debouncer::new(debounce, on_fire),
        });

        let seed_task = {
            let shared = Arc::clone(&shared);
            let mut rx = status.watch();
            tokio::spawn(async move {
                let data = match rx.wait_for(|s| s.data.is_some()).await {
                    Ok(state) => state.data.clone(),
                    Err(_) => return,
                };
                if let Some(data) = data {
                    shared.seed(&data);
                }
            })
        };

        Self {
            status,
            shared,
            mutations,
            unmounted,
            seed_task,
        }
    }

    /// Wait until the buffer is seeded. Fails if the status read failed
    /// before any data arrived.
    pub async fn ready(&self) -> Result<LedSettings, CoreError> {
        let mut buffer = self.shared.buffer.subscribe();
        let mut status = self.status.watch();
        loop {
            if let Some(settings) = buffer.borrow_and_update().clone() {
                return Ok(settings);
            }
            {
                let state = status.borrow_and_update();
                if let (None, Some(err), false) =
                    (&state.data, &state.error, state.is_fetching())
                {
                    return Err(err.clone());
                }
            }
            tokio::select! {
                r = buffer.changed() => r.map_err(|_| closed())?,
                r = status.changed() => r.map_err(|_| closed())?,
            }
        }
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Apply an edit and re-arm the debouncer. Returns `false` while the
    /// panel is still waiting for its first status read.
    pub fn edit(&self, f: impl FnOnce(&mut LedSettings)) -> bool {
        match self.shared.buffer.edit(f) {
            Some(snapshot) => {
                self.shared.debouncer.schedule(snapshot);
                true
            }
            None => {
                debug!("LED edit ignored: controls not ready");
                false
            }
        }
    }

    pub fn toggle(&self) -> bool {
        self.edit(|s| s.on = !s.on)
    }

    pub fn set_on(&self, on: bool) -> bool {
        self.edit(|s| s.on = on)
    }

    /// Values above 100 are clamped.
    pub fn set_brightness(&self, brightness: u8) -> bool {
        self.edit(|s| s.brightness = brightness.min(100))
    }

    pub fn set_color(&self, color: Rgb) -> bool {
        self.edit(|s| s.color = color)
    }

    pub fn set_sleep(&self, sleep: SleepTimer) -> bool {
        self.edit(|s| s.sleep = sleep)
    }

    /// `None` removes the preset.
    pub fn set_preset(&self, preset: Option<LedPreset>) -> bool {
        self.edit(|s| s.preset = preset)
    }

    // ── View state ───────────────────────────────────────────────────

    /// Local settings, which lead the server while edits are in flight.
    pub fn settings(&self) -> Option<LedSettings> {
        self.shared.buffer.snapshot()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.settings().map(|s| s.on)
    }

    /// The power button's action label.
    pub fn toggle_label(&self) -> &'static str {
        if self.is_on().unwrap_or(false) {
            "Off"
        } else {
            "On"
        }
    }

    /// A debounced send is waiting for the quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.shared.debouncer.is_pending()
    }

    pub fn status(&self) -> &QuerySubscription<LedStatus> {
        &self.status
    }

    /// Settled results of this panel's configure requests, latest first.
    pub fn mutations(&self) -> watch::Receiver<Option<MutationState>> {
        self.mutations.subscribe()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LedSettings>> {
        self.shared.buffer.subscribe()
    }
}

impl Drop for LedController {
    fn drop(&mut self) {
        self.unmounted.cancel();
        self.shared.debouncer.cancel();
        self.seed_task.abort();
    }
}

impl fmt::Debug for LedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedController")
            .field("settings", &self.settings())
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

fn closed() -> CoreError {
    CoreError::Internal("LED status channel closed".into())
}

fn report(toaster: &Toaster, sent: &LedSettings, result: Result<CommandResult, CoreError>) {
    match result {
        Ok(CommandResult::Leds(status)) => {
            if let Some(err) = status.error {
                toaster.error(err);
                return;
            }
            let on = status.is_on().unwrap_or(sent.on);
            toaster.success(if on { "LEDs are on" } else { "LEDs are off" });
        }
        Ok(_) => toaster.success(if sent.on { "LEDs are on" } else { "LEDs are off" }),
        Err(err) => toaster.error(err.message_or("Failed to update LEDs")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn seed_defaults_for_missing_fields() {
        let settings = LedSettings::from_status(&LedStatus::default());
        assert_eq!(settings, LedSettings::default());

        let status = LedStatus {
            power: Some("on".into()),
            brightness: Some(0),
            color: Some(Rgb::new(10, 20, 30)),
            preset: Some(LedPreset::Chase),
            ..LedStatus::default()
        };
        let settings = LedSettings::from_status(&status);
        assert!(settings.on);
        assert_eq!(settings.brightness, 50);
        assert_eq!(settings.color, Rgb::new(10, 20, 30));
        assert_eq!(settings.preset, None);
    }

    #[test]
    fn request_carries_full_snapshot() {
        let settings = LedSettings {
            on: true,
            brightness: 80,
            color: Rgb::new(255, 0, 0),
            sleep: SleepTimer::OneHour,
            preset: Some(LedPreset::Rainbow),
        };
        let req = settings.to_request();
        assert_eq!(req.on, Some(true));
        assert_eq!(req.sleep, Some(3_600_000));
        assert_eq!(req.color.as_deref(), Some("255, 0, 0"));
        assert_eq!(req.preset, Some(LedPreset::Rainbow));
    }

    #[test]
    fn sleep_timer_parsing() {
        assert_eq!("30m".parse::<SleepTimer>(), Ok(SleepTimer::ThirtyMinutes));
        assert_eq!("None".parse::<SleepTimer>(), Ok(SleepTimer::Off));
        assert!("3h".parse::<SleepTimer>().is_err());
        assert_eq!(SleepTimer::from_millis(7_200_000), Some(SleepTimer::TwoHours));
        assert_eq!(SleepTimer::from_millis(1), None);
    }
}
