// Event and state-change endpoints
//
// The panel event log (`panels/event`, paged by id) and the refreshStates
// long-poll (continued with an opaque `last` token).

use tracing::debug;

use crate::error::Error;
use crate::hc::client::HcClient;
use crate::hc::models::{HcEvent, RefreshStates};

impl HcClient {
    /// Read a page of the event log.
    ///
    /// `GET /api/panels/event?type=id&last={last}[&startFrom={start_from}]`
    ///
    /// Returns at most `last` events with ids `<= start_from`, newest first.
    /// Without `start_from` the newest events in the log are returned. An
    /// empty log may come back as `null` rather than `[]`.
    pub async fn panels_events(
        &self,
        last: u32,
        start_from: Option<u64>,
    ) -> Result<Vec<HcEvent>, Error> {
        let mut url = self.api_url("panels/event")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("type", "id");
            query.append_pair("last", &last.to_string());
            if let Some(start) = start_from {
                query.append_pair("startFrom", &start.to_string());
            }
        }
        debug!(last, ?start_from, "listing panel events");
        let events: Option<Vec<HcEvent>> = self.get(url).await?;
        Ok(events.unwrap_or_default())
    }

    /// Poll device state changes since `last`.
    ///
    /// `GET /api/refreshStates?last={last}`
    pub async fn refresh_states(&self, last: &str) -> Result<RefreshStates, Error> {
        let mut url = self.api_url("refreshStates")?;
        url.query_pairs_mut().append_pair("last", last);
        debug!(last, "polling refreshStates");
        self.get(url).await
    }
}
