use countdown_domain::{CalendarUnit, Event, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDTO {
    pub id: ID,
    pub name: String,
    pub due_ts: i64,
    pub color_hex: String,
    pub is_recurring: bool,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<u8>>,
    pub version: i64,
    pub created: i64,
    pub updated: i64,
}

impl EventDTO {
    pub fn new(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            due_ts: event.due_ts,
            color_hex: event.color_hex,
            is_recurring: event.is_recurring,
            recurrence_interval: event.recurrence_interval,
            recurrence_unit: event.recurrence_unit,
            components: event.components,
            version: event.version,
            created: event.created,
            updated: event.updated,
        }
    }
}

/// Outcome of one bulk refresh of overdue events
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReportDTO {
    pub evaluated: usize,
    pub rolled_over: Vec<ID>,
    pub deleted: Vec<ID>,
    pub failed: Vec<ID>,
    pub stale: Vec<ID>,
    pub persisted: bool,
}
