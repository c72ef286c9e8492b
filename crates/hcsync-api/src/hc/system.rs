// System endpoints
//
// Point-in-time snapshots with no paging: weather and diagnostics.

use tracing::debug;

use crate::error::Error;
use crate::hc::client::HcClient;
use crate::hc::models::{Diagnostics, Weather};

impl HcClient {
    /// `GET /api/weather`
    pub async fn weather(&self) -> Result<Weather, Error> {
        let url = self.api_url("weather")?;
        debug!("fetching weather");
        self.get(url).await
    }

    /// `GET /api/diagnostics`
    pub async fn diagnostics(&self) -> Result<Diagnostics, Error> {
        let url = self.api_url("diagnostics")?;
        debug!("fetching diagnostics");
        self.get(url).await
    }
}
