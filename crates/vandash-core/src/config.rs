// ── Runtime dashboard configuration ──
//
// These types describe *how* to talk to the backend and how the client-side
// pipeline is tuned. They never touch disk: the CLI (via vandash-config)
// constructs a `DashboardConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed reverse proxy).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard backend.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend base URL (e.g. `http://van.local:5000`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Quiet period before LED edits are sent.
    pub led_debounce: Duration,
    /// How long a toast stays visible.
    pub toast_duration: Duration,
    /// Level sensor polling period. Zero disables polling.
    pub level_poll_interval: Duration,
    /// Battery shunt polling period. Zero disables polling.
    pub shunt_poll_interval: Duration,
    /// How long data from the last successful fetch keeps being shown
    /// after a failed refetch before the view switches to an error.
    pub stale_tolerance: Duration,
    /// Slideshow auto-advance period.
    pub slideshow_interval: Duration,
}

impl DashboardConfig {
    /// Config for `url` with the dashboard's stock tuning.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            led_debounce: Duration::from_millis(500),
            toast_duration: Duration::from_secs(5),
            level_poll_interval: Duration::from_secs(15),
            shunt_poll_interval: Duration::from_secs(20),
            stale_tolerance: Duration::from_secs(30),
            slideshow_interval: Duration::from_secs(5),
        }
    }

    /// Polling period as an `Option`, treating zero as "don't poll".
    pub(crate) fn poll(period: Duration) -> Option<Duration> {
        (!period.is_zero()).then_some(period)
    }
}
