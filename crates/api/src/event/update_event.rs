use super::subscribers::SignalEndedOnOverdueEvent;
use crate::{
    error::CountdownError,
    shared::usecase::{execute, Subscriber, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::update_event::*;
use countdown_domain::{CalendarUnit, Event, ID};
use countdown_infra::{CountdownContext, StoreError};

pub async fn update_event_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let body = body.0;
    let usecase = UpdateEventUseCase {
        event_id: path_params.event_id,
        name: body.name,
        due_ts: body.due_ts,
        color_hex: body.color_hex,
        is_recurring: body.is_recurring,
        recurrence_interval: body.recurrence_interval,
        recurrence_unit: body.recurrence_unit,
        version: body.version,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(CountdownError::from)
}

/// Partial update, fields left as `None` keep their current value
#[derive(Debug, Default)]
pub struct UpdateEventUseCase {
    pub event_id: ID,
    pub name: Option<String>,
    pub due_ts: Option<i64>,
    pub color_hex: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
    pub version: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidEvent(String),
    Conflict(ID),
    StorageError,
}

impl From<UseCaseError> for CountdownError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The event with id: {}, was not found.",
                event_id
            )),
            UseCaseError::InvalidEvent(msg) => Self::BadClientData(msg),
            UseCaseError::Conflict(event_id) => Self::Conflict(format!(
                "The event with id: {}, was changed by someone else. Fetch it and try again.",
                event_id
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for UpdateEventUseCase {
    type Response = Event;

    type Errors = UseCaseError;

    const NAME: &'static str = "UpdateEvent";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        let mut e = match ctx.store.find(&self.event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => return Err(UseCaseError::NotFound(self.event_id)),
            Err(_) => return Err(UseCaseError::StorageError),
        };
        if let Some(version) = self.version {
            if version != e.version {
                return Err(UseCaseError::Conflict(self.event_id));
            }
        }

        if let Some(name) = &self.name {
            e.name = name.clone();
        }
        if let Some(due_ts) = self.due_ts {
            e.due_ts = due_ts;
        }
        if let Some(color_hex) = &self.color_hex {
            e.color_hex = color_hex.clone();
        }
        if let Some(is_recurring) = self.is_recurring {
            e.is_recurring = is_recurring;
        }
        if self.recurrence_interval.is_some() {
            e.recurrence_interval = self.recurrence_interval;
        }
        if self.recurrence_unit.is_some() {
            e.recurrence_unit = self.recurrence_unit;
        }
        e.updated = ctx.sys.get_timestamp_millis();

        ctx.store.update(e).await.map_err(|e| match e {
            StoreError::InvalidEvent(e) => UseCaseError::InvalidEvent(e.to_string()),
            StoreError::StaleWrite(event_id) => UseCaseError::Conflict(event_id),
            StoreError::Persistence(_) => UseCaseError::StorageError,
        })
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(SignalEndedOnOverdueEvent)]
    }
}
