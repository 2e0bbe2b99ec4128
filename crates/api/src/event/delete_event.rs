use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::delete_event::*;
use countdown_domain::{Event, ID};
use countdown_infra::{CountdownContext, StoreError};

fn handle_error(e: UseCaseError) -> CountdownError {
    match e {
        UseCaseError::NotFound(event_id) => CountdownError::NotFound(format!(
            "The event with id: {}, was not found.",
            event_id
        )),
        UseCaseError::Conflict(event_id) => CountdownError::Conflict(format!(
            "The event with id: {}, was changed while deleting it. Please try again.",
            event_id
        )),
        UseCaseError::StorageError => CountdownError::InternalError,
    }
}

pub async fn delete_event_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let usecase = DeleteEventUseCase {
        event_id: path_params.event_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct DeleteEventUseCase {
    pub event_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    Conflict(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for DeleteEventUseCase {
    type Response = Event;

    type Errors = UseCaseError;

    const NAME: &'static str = "DeleteEvent";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        match ctx.store.delete(&self.event_id).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(UseCaseError::NotFound(self.event_id)),
            Err(StoreError::StaleWrite(event_id)) => Err(UseCaseError::Conflict(event_id)),
            Err(_) => Err(UseCaseError::StorageError),
        }
    }
}
