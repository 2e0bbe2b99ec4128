use super::subscribers::SignalEndedOnOverdueEvent;
use crate::error::CountdownError;
use crate::shared::usecase::{execute, Subscriber, UseCase};
use actix_web::{web, HttpResponse};
use countdown_api_structs::create_event::*;
use countdown_domain::{CalendarUnit, Event};
use countdown_infra::{CountdownContext, StoreError};

pub async fn create_event_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let body = body.0;
    let usecase = CreateEventUseCase {
        name: body.name,
        due_ts: body.due_ts,
        color_hex: body.color_hex,
        is_recurring: body.is_recurring,
        recurrence_interval: body.recurrence_interval,
        recurrence_unit: body.recurrence_unit,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Created().json(APIResponse::new(event)))
        .map_err(CountdownError::from)
}

#[derive(Debug)]
pub struct CreateEventUseCase {
    pub name: String,
    pub due_ts: i64,
    pub color_hex: String,
    pub is_recurring: bool,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<CalendarUnit>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidEvent(String),
    StorageError,
}

impl From<UseCaseError> for CountdownError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidEvent(msg) => Self::BadClientData(msg),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CreateEventUseCase {
    type Response = Event;

    type Errors = UseCaseError;

    const NAME: &'static str = "CreateEvent";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        let now = ctx.sys.get_timestamp_millis();
        let mut e = Event::new(&self.name, self.due_ts, &self.color_hex, now);
        e.is_recurring = self.is_recurring;
        e.recurrence_interval = self.recurrence_interval;
        e.recurrence_unit = self.recurrence_unit;

        ctx.store.create(e).await.map_err(|e| match e {
            StoreError::InvalidEvent(e) => UseCaseError::InvalidEvent(e.to_string()),
            _ => UseCaseError::StorageError,
        })
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(SignalEndedOnOverdueEvent)]
    }
}
