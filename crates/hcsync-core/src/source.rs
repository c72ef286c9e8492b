// ── Telemetry source ──
//
// The read-only controller surface the engine pulls from. `HcSource` is
// the production implementation over `hcsync_api::HcClient`; tests use an
// in-memory fake.

use std::future::Future;

use hcsync_api::HcClient;

use crate::error::CoreError;
use crate::model::{
    Device, DeviceId, Diagnostics, EnergyAggregate, PanelEvent, Room, Section, StatePoll, Weather,
};

pub trait TelemetrySource: Send + Sync {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, CoreError>> + Send;

    fn list_sections(&self) -> impl Future<Output = Result<Vec<Section>, CoreError>> + Send;

    /// Poll state changes since the continuation token `last`.
    fn refresh_states(
        &self,
        last: &str,
    ) -> impl Future<Output = Result<StatePoll, CoreError>> + Send;

    /// Id of the newest event in the log, `None` when the log is empty.
    fn newest_event_id(&self) -> impl Future<Output = Result<Option<u64>, CoreError>> + Send;

    /// Up to `limit` events with ids in `[from, from + limit - 1]`.
    ///
    /// Order is whatever the source produces; callers sort. Sources may
    /// include events older than `from`.
    fn list_events(
        &self,
        from: u64,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<PanelEvent>, CoreError>> + Send;

    /// Energy aggregate of `device` over `[from, to]`, `None` when the
    /// window holds no data.
    fn consumption(
        &self,
        device: DeviceId,
        from: i64,
        to: i64,
    ) -> impl Future<Output = Result<Option<EnergyAggregate>, CoreError>> + Send;

    fn weather(&self) -> impl Future<Output = Result<Weather, CoreError>> + Send;

    fn diagnostics(&self) -> impl Future<Output = Result<Diagnostics, CoreError>> + Send;
}

/// [`TelemetrySource`] backed by the Home Center REST API.
pub struct HcSource {
    client: HcClient,
}

impl HcSource {
    pub fn new(client: HcClient) -> Self {
        Self { client }
    }
}

impl TelemetrySource for HcSource {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let devices = self.client.list_devices().await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, CoreError> {
        let rooms = self.client.list_rooms().await?;
        Ok(rooms.into_iter().map(Room::from).collect())
    }

    async fn list_sections(&self) -> Result<Vec<Section>, CoreError> {
        let sections = self.client.list_sections().await?;
        Ok(sections.into_iter().map(Section::from).collect())
    }

    async fn refresh_states(&self, last: &str) -> Result<StatePoll, CoreError> {
        Ok(self.client.refresh_states(last).await?.into())
    }

    async fn newest_event_id(&self) -> Result<Option<u64>, CoreError> {
        let newest = self.client.panels_events(1, None).await?;
        Ok(newest.iter().map(|e| e.id).max())
    }

    async fn list_events(&self, from: u64, limit: u32) -> Result<Vec<PanelEvent>, CoreError> {
        // The log is paged backwards from `startFrom`.
        let start_from = from.saturating_add(u64::from(limit.max(1)) - 1);
        let events = self.client.panels_events(limit, Some(start_from)).await?;
        Ok(events.into_iter().map(PanelEvent::from).collect())
    }

    async fn consumption(
        &self,
        device: DeviceId,
        from: i64,
        to: i64,
    ) -> Result<Option<EnergyAggregate>, CoreError> {
        let aggregate = self.client.energy_compare(device.0, from, to).await?;
        Ok(aggregate.map(EnergyAggregate::from))
    }

    async fn weather(&self) -> Result<Weather, CoreError> {
        Ok(self.client.weather().await?.into())
    }

    async fn diagnostics(&self) -> Result<Diagnostics, CoreError> {
        Ok(self.client.diagnostics().await?.into())
    }
}
