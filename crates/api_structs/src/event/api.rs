use crate::dtos::{EventDTO, RefreshReportDTO};
use countdown_domain::{CalendarUnit, Event, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event: EventDTO,
}

impl EventResponse {
    pub fn new(event: Event) -> Self {
        Self {
            event: EventDTO::new(event),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<EventDTO>,
}

impl EventsResponse {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into_iter().map(EventDTO::new).collect(),
        }
    }
}

pub mod create_event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub name: String,
        pub due_ts: i64,
        pub color_hex: String,
        #[serde(default)]
        pub is_recurring: bool,
        #[serde(default)]
        pub recurrence_interval: Option<i64>,
        #[serde(default)]
        pub recurrence_unit: Option<CalendarUnit>,
    }

    pub type APIResponse = EventResponse;
}

pub mod get_event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    pub type APIResponse = EventResponse;
}

pub mod get_events {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        /// Only overdue events when true, only pending events when false
        pub overdue: Option<bool>,
    }

    pub type APIResponse = EventsResponse;
}

pub mod update_event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    #[derive(Serialize, Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub due_ts: Option<i64>,
        #[serde(default)]
        pub color_hex: Option<String>,
        #[serde(default)]
        pub is_recurring: Option<bool>,
        #[serde(default)]
        pub recurrence_interval: Option<i64>,
        #[serde(default)]
        pub recurrence_unit: Option<CalendarUnit>,
        /// Rejects the update when the event has changed since this version
        #[serde(default)]
        pub version: Option<i64>,
    }

    pub type APIResponse = EventResponse;
}

pub mod delete_event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    pub type APIResponse = EventResponse;
}

pub mod delete_events {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub deleted_count: u64,
    }
}

pub mod signal_event_ended {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub event_id: ID,
    }
}

pub mod refresh_events {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub report: RefreshReportDTO,
    }
}

pub mod seed_sample_events {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub count: usize,
        #[serde(default)]
        pub seed: Option<u64>,
    }

    pub type APIResponse = EventsResponse;
}

pub mod get_event_changes {
    /// Name of the server sent event emitted after every committed change.
    /// It carries no payload, clients query the events again.
    pub const CHANGED_EVENT: &str = "changed";
}
