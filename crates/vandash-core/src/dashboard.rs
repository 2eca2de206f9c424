// ── Dashboard facade ──
//
// Owns the API client, the toast slot and one query cache per resource.
// Views mount controls and subscriptions from here; the CLI uses the same
// entry points for one-shot commands.

use std::sync::Arc;

use tracing::{debug, info};

use vandash_api::{
    ApiClient, FileItem, InverterStatus, LedStatus, LevelSensorData, ShuntData, TlsMode,
    TransportConfig,
};

use crate::command::{self, Command, CommandResult};
use crate::config::{DashboardConfig, TlsVerification};
use crate::control::{InverterControl, LedController};
use crate::error::CoreError;
use crate::files::FileManager;
use crate::mutation::MutationHandle;
use crate::query::{
    QueryCache, QueryState, QuerySubscription, StalePolicy, SubscribeOptions, fetcher,
};
use crate::toast::Toaster;

/// Query keys for the fixed device resources.
pub mod keys {
    use crate::query::QueryKey;

    pub fn inverter() -> QueryKey {
        QueryKey::new("/inverter")
    }

    pub fn leds() -> QueryKey {
        QueryKey::new("/leds")
    }

    pub fn level_sensor() -> QueryKey {
        QueryKey::new("/level_sensor/data")
    }

    pub fn shunt() -> QueryKey {
        QueryKey::new("/smartshunt/data")
    }
}

/// Entry point to a dashboard backend. Cheap to clone.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: ApiClient,
    toaster: Toaster,
    inverter: QueryCache<InverterStatus>,
    leds: QueryCache<LedStatus>,
    level: QueryCache<LevelSensorData>,
    shunt: QueryCache<ShuntData>,
    files: Arc<QueryCache<Vec<FileItem>>>,
}

/// One read of every device resource, for status overviews.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub inverter: Result<InverterStatus, CoreError>,
    pub leds: Result<LedStatus, CoreError>,
    pub level: Result<LevelSensorData, CoreError>,
    pub battery: Result<ShuntData, CoreError>,
}

impl Dashboard {
    /// Build the HTTP client for `config` and create the caches.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = ApiClient::new(config.url.clone(), &transport)?;
        debug!(url = %config.url, "dashboard client ready");
        Ok(Self::with_client(config, client))
    }

    /// Use an existing client (tests, custom transports).
    pub fn with_client(config: DashboardConfig, client: ApiClient) -> Self {
        let toaster = Toaster::new(config.toast_duration);
        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                toaster,
                inverter: QueryCache::new(),
                leds: QueryCache::new(),
                level: QueryCache::new(),
                shunt: QueryCache::new(),
                files: Arc::new(QueryCache::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn toaster(&self) -> &Toaster {
        &self.inner.toaster
    }

    pub fn stale_policy(&self) -> StalePolicy {
        StalePolicy::new(self.inner.config.stale_tolerance)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Level sensor readings, polled while subscribed.
    pub fn level_sensor(&self) -> QuerySubscription<LevelSensorData> {
        let client = self.inner.client.clone();
        self.inner.level.subscribe(
            keys::level_sensor(),
            fetcher(move || {
                let client = client.clone();
                async move { client.level_sensor_data().await.map_err(CoreError::from) }
            }),
            polling(self.inner.config.level_poll_interval),
        )
    }

    /// Battery shunt readings, polled while subscribed.
    pub fn battery(&self) -> QuerySubscription<ShuntData> {
        let client = self.inner.client.clone();
        self.inner.shunt.subscribe(
            keys::shunt(),
            fetcher(move || {
                let client = client.clone();
                async move { client.shunt_data().await.map_err(CoreError::from) }
            }),
            polling(self.inner.config.shunt_poll_interval),
        )
    }

    fn inverter_status(&self) -> QuerySubscription<InverterStatus> {
        let client = self.inner.client.clone();
        self.inner.inverter.subscribe(
            keys::inverter(),
            fetcher(move || {
                let client = client.clone();
                async move { client.inverter_status().await.map_err(CoreError::from) }
            }),
            SubscribeOptions::default().refetch_on_subscribe(),
        )
    }

    fn led_status(&self) -> QuerySubscription<LedStatus> {
        let client = self.inner.client.clone();
        self.inner.leds.subscribe(
            keys::leds(),
            fetcher(move || {
                let client = client.clone();
                async move { client.led_status().await.map_err(CoreError::from) }
            }),
            SubscribeOptions::default(),
        )
    }

    // ── Controls ─────────────────────────────────────────────────────

    /// Mount the inverter button (refreshes its status on every mount).
    pub fn inverter(&self) -> InverterControl {
        InverterControl::mount(
            self.inverter_status(),
            self.inner.client.clone(),
            self.inner.toaster.clone(),
        )
    }

    /// Mount the LED panel.
    pub fn leds(&self) -> LedController {
        LedController::mount(
            self.led_status(),
            self.inner.client.clone(),
            self.inner.toaster.clone(),
            self.inner.config.led_debounce,
        )
    }

    /// Mount the file manager at the root folder.
    pub fn files(&self) -> FileManager {
        FileManager::mount(
            self.inner.client.clone(),
            self.inner.toaster.clone(),
            Arc::clone(&self.inner.files),
            self.stale_policy(),
            self.inner.config.slideshow_interval,
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run a command and wait for its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        command::route(&self.inner.client, cmd).await
    }

    /// Run a command in the background as a tracked mutation.
    pub fn mutate(&self, cmd: Command) -> MutationHandle {
        MutationHandle::spawn(self.inner.client.clone(), cmd)
    }

    /// Ask the backend process to exit.
    pub async fn kill_app(&self) -> Result<(), CoreError> {
        info!(url = %self.inner.config.url, "requesting backend restart");
        self.execute(Command::KillApp).await.map(|_| ())
    }

    /// Read every device resource once, concurrently.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let client = &self.inner.client;
        let (inverter, leds, level, battery) = tokio::join!(
            client.inverter_status(),
            client.led_status(),
            client.level_sensor_data(),
            client.shunt_data(),
        );
        DashboardSnapshot {
            inverter: inverter.map_err(CoreError::from),
            leds: leds.map_err(CoreError::from),
            level: level.map_err(CoreError::from),
            battery: battery.map_err(CoreError::from),
        }
    }

    /// Drop cache entries no view is subscribed to.
    pub fn prune_unused(&self) -> usize {
        self.inner.inverter.prune_unused()
            + self.inner.leds.prune_unused()
            + self.inner.level.prune_unused()
            + self.inner.shunt.prune_unused()
            + self.inner.files.prune_unused()
    }

    /// Current state of a listing key, without subscribing.
    pub fn cached_listing(&self, path: &str) -> Option<QueryState<Vec<FileItem>>> {
        self.inner.files.get(&crate::files::listing_key(path))
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("url", &self.inner.config.url.as_str())
            .finish_non_exhaustive()
    }
}

fn polling(period: std::time::Duration) -> SubscribeOptions {
    SubscribeOptions {
        poll_interval: DashboardConfig::poll(period),
        refetch_on_subscribe: false,
    }
}

fn build_transport(config: &DashboardConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
