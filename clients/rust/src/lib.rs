mod base;
mod event;
mod status;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIErrorVariant, APIResponse};
pub use countdown_api_structs::dtos::*;
pub use countdown_domain::{CalendarUnit, ID};
pub use reqwest::StatusCode;
use event::EventClient;
pub use event::{CreateEventInput, EventChanges, EventsChanged, UpdateEventInput};
use status::StatusClient;
use std::sync::Arc;

// Domain
pub use countdown_api_structs::dtos::EventDTO as Event;
pub use countdown_api_structs::dtos::RefreshReportDTO as RefreshReport;

/// Countdown Server SDK
///
/// The SDK contains methods for interacting with the Countdown server
/// API.
#[derive(Clone)]
pub struct CountdownSDK {
    pub event: EventClient,
    pub status: StatusClient,
}

impl CountdownSDK {
    pub fn new(address: String) -> Self {
        let base = Arc::new(BaseClient::new(address));
        let event = EventClient::new(base.clone());
        let status = StatusClient::new(base);

        Self { event, status }
    }
}
