// Backend process control

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;

impl ApiClient {
    /// Ask the backend process to exit (a supervisor restarts it).
    ///
    /// `POST /app/kill`. The response body is ignored.
    pub async fn kill_app(&self) -> Result<(), Error> {
        let url = self.url("app/kill")?;
        debug!("requesting backend shutdown");
        self.post_discard(url).await
    }
}
