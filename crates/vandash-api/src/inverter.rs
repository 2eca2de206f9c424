// Inverter endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{InverterStatus, ToggleResponse};

impl ApiClient {
    /// Current inverter power state.
    ///
    /// `GET /inverter`
    pub async fn inverter_status(&self) -> Result<InverterStatus, Error> {
        let url = self.url("inverter")?;
        self.get(url).await
    }

    /// Flip the inverter relay. The response carries the new state.
    ///
    /// `POST /inverter/toggle`
    pub async fn toggle_inverter(&self) -> Result<ToggleResponse, Error> {
        let url = self.url("inverter/toggle")?;
        debug!("toggling inverter");
        self.post_empty(url).await
    }
}
