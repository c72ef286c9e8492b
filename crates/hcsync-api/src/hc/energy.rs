// Energy endpoints
//
// Consumption aggregates for a single device over a closed timestamp range.

use tracing::debug;

use crate::error::Error;
use crate::hc::client::HcClient;
use crate::hc::models::{EnergyCompare, OneOrMany};

impl HcClient {
    /// Fetch the power/energy aggregate of one device over `[from, to]`.
    ///
    /// `GET /api/energy/{from}/{to}/compare/devices/power/{device_id}`
    ///
    /// Returns `None` when the controller has no data for the window
    /// (`null` or an empty list). When a list comes back, the entry for
    /// `device_id` wins over any other.
    pub async fn energy_compare(
        &self,
        device_id: u64,
        from: i64,
        to: i64,
    ) -> Result<Option<EnergyCompare>, Error> {
        let url = self.api_url(&format!(
            "energy/{from}/{to}/compare/devices/power/{device_id}"
        ))?;
        debug!(device_id, from, to, "fetching energy aggregate");

        let data: Option<OneOrMany<EnergyCompare>> = self.get(url).await?;
        let mut entries = data.map(OneOrMany::into_vec).unwrap_or_default();
        if entries.is_empty() {
            return Ok(None);
        }

        let position = entries
            .iter()
            .position(|e| e.id == Some(device_id))
            .unwrap_or(0);
        Ok(Some(entries.swap_remove(position)))
    }
}
