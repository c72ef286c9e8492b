// Reference data endpoints
//
// Devices, rooms and sections: the static graph every telemetry record
// is joined against.

use tracing::debug;

use crate::error::Error;
use crate::hc::client::HcClient;
use crate::hc::models::{HcDevice, HcRoom, HcSection};

impl HcClient {
    /// List all devices.
    ///
    /// `GET /api/devices`
    pub async fn list_devices(&self) -> Result<Vec<HcDevice>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing devices");
        self.get(url).await
    }

    /// List all rooms.
    ///
    /// `GET /api/rooms`
    pub async fn list_rooms(&self) -> Result<Vec<HcRoom>, Error> {
        let url = self.api_url("rooms")?;
        debug!("listing rooms");
        self.get(url).await
    }

    /// List all sections.
    ///
    /// `GET /api/sections`
    pub async fn list_sections(&self) -> Result<Vec<HcSection>, Error> {
        let url = self.api_url("sections")?;
        debug!("listing sections");
        self.get(url).await
    }
}
