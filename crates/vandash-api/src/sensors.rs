// Read-only sensor endpoints (level sensor, battery shunt)

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{LevelSensorData, ShuntData};

impl ApiClient {
    /// `GET /level_sensor/data`
    pub async fn level_sensor_data(&self) -> Result<LevelSensorData, Error> {
        let url = self.url("level_sensor/data")?;
        self.get(url).await
    }

    /// Battery monitor readings.
    ///
    /// `GET /smartshunt/data`. The shunt is read over a flaky serial link and
    /// the backend sometimes answers with an empty body; that surfaces as
    /// [`Error::Deserialization`].
    pub async fn shunt_data(&self) -> Result<ShuntData, Error> {
        let url = self.url("smartshunt/data")?;
        self.get(url).await
    }
}
