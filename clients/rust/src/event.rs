use crate::{APIError, APIErrorVariant, APIResponse, BaseClient, CalendarUnit, ID};
use countdown_api_structs::*;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct EventClient {
    base: Arc<BaseClient>,
}

pub struct CreateEventInput {
    pub name: String,
    pub due_ts: i64,
    pub color_hex: String,
    pub is_recurring: bool,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
}

#[derive(Default)]
pub struct UpdateEventInput {
    pub event_id: ID,
    pub name: Option<String>,
    pub due_ts: Option<i64>,
    pub color_hex: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
    pub version: Option<i64>,
}

#[derive(Serialize)]
struct Empty {}

/// Something changed in the event store, the events should be fetched again
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventsChanged;

/// Subscription to the change stream of the server
pub struct EventChanges {
    response: Response,
    buffer: String,
}

impl EventChanges {
    /// Waits for the next change. `None` once the server closed the stream.
    pub async fn next(&mut self) -> APIResponse<Option<EventsChanged>> {
        loop {
            while let Some(end) = self.buffer.find("\n\n") {
                let frame = self.buffer[..end].to_string();
                self.buffer.replace_range(..end + 2, "");
                let is_change = frame
                    .lines()
                    .any(|line| line == format!("event: {}", get_event_changes::CHANGED_EVENT));
                if is_change {
                    return Ok(Some(EventsChanged));
                }
            }

            let chunk = self.response.chunk().await.map_err(|e| APIError {
                variant: APIErrorVariant::Network,
                message: e.to_string(),
            })?;
            match chunk {
                Some(chunk) => self.buffer.push_str(&String::from_utf8_lossy(&chunk)),
                None => return Ok(None),
            }
        }
    }
}

impl EventClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, input: CreateEventInput) -> APIResponse<create_event::APIResponse> {
        let body = create_event::RequestBody {
            name: input.name,
            due_ts: input.due_ts,
            color_hex: input.color_hex,
            is_recurring: input.is_recurring,
            recurrence_interval: input.recurrence_interval,
            recurrence_unit: input.recurrence_unit,
        };

        self.base
            .post(body, "events".into(), StatusCode::CREATED)
            .await
    }

    pub async fn get(&self, event_id: ID) -> APIResponse<get_event::APIResponse> {
        self.base
            .get(format!("events/{}", event_id), StatusCode::OK)
            .await
    }

    /// All events ordered by due date. `overdue` filters on whether the
    /// events are overdue according to the server clock.
    pub async fn get_all(&self, overdue: Option<bool>) -> APIResponse<get_events::APIResponse> {
        let path = match overdue {
            Some(overdue) => format!("events?overdue={}", overdue),
            None => "events".into(),
        };
        self.base.get(path, StatusCode::OK).await
    }

    /// Subscribes to every change of the events. Changes committed before
    /// this returns are not delivered.
    pub async fn changes(&self) -> APIResponse<EventChanges> {
        let response = self
            .base
            .get_response("events/changes".into(), StatusCode::OK)
            .await?;
        Ok(EventChanges {
            response,
            buffer: String::new(),
        })
    }

    pub async fn update(&self, input: UpdateEventInput) -> APIResponse<update_event::APIResponse> {
        let event_id = input.event_id;
        let body = update_event::RequestBody {
            name: input.name,
            due_ts: input.due_ts,
            color_hex: input.color_hex,
            is_recurring: input.is_recurring,
            recurrence_interval: input.recurrence_interval,
            recurrence_unit: input.recurrence_unit,
            version: input.version,
        };
        self.base
            .put(body, format!("events/{}", event_id), StatusCode::OK)
            .await
    }

    pub async fn delete(&self, event_id: ID) -> APIResponse<delete_event::APIResponse> {
        self.base
            .delete(format!("events/{}", event_id), StatusCode::OK)
            .await
    }

    pub async fn delete_all(&self) -> APIResponse<delete_events::APIResponse> {
        self.base.delete("events".into(), StatusCode::OK).await
    }

    /// Tells the server that the countdown of the event reached zero
    pub async fn signal_ended(&self, event_id: ID) -> APIResponse<signal_event_ended::APIResponse> {
        self.base
            .post(
                Empty {},
                format!("events/{}/ended", event_id),
                StatusCode::ACCEPTED,
            )
            .await
    }

    /// Refreshes every overdue event and waits for the outcome
    pub async fn refresh(&self) -> APIResponse<refresh_events::APIResponse> {
        self.base
            .post(Empty {}, "events/refresh".into(), StatusCode::OK)
            .await
    }

    pub async fn seed_samples(
        &self,
        count: usize,
        seed: Option<u64>,
    ) -> APIResponse<seed_sample_events::APIResponse> {
        let body = seed_sample_events::RequestBody { count, seed };
        self.base
            .post(body, "events/samples".into(), StatusCode::CREATED)
            .await
    }
}
