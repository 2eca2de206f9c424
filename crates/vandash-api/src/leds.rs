// LED strip endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{LedConfigureRequest, LedStatus};

impl ApiClient {
    /// Current LED power, brightness, color and preset.
    ///
    /// `GET /leds`
    pub async fn led_status(&self) -> Result<LedStatus, Error> {
        let url = self.url("leds")?;
        self.get(url).await
    }

    /// Apply LED settings. Fields left as `None` are not touched.
    ///
    /// `POST /leds/configure`
    pub async fn configure_leds(&self, request: &LedConfigureRequest) -> Result<LedStatus, Error> {
        let url = self.url("leds/configure")?;
        debug!(?request, "configuring leds");
        self.post(url, request).await
    }
}
