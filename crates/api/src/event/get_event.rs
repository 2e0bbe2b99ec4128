use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::get_event::*;
use countdown_domain::{Event, ID};
use countdown_infra::CountdownContext;

fn handle_error(e: UseCaseError) -> CountdownError {
    match e {
        UseCaseError::NotFound(event_id) => CountdownError::NotFound(format!(
            "The event with id: {}, was not found.",
            event_id
        )),
        UseCaseError::StorageError => CountdownError::InternalError,
    }
}

pub async fn get_event_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let usecase = GetEventUseCase {
        event_id: path_params.event_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|event| HttpResponse::Ok().json(APIResponse::new(event)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct GetEventUseCase {
    pub event_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for GetEventUseCase {
    type Response = Event;

    type Errors = UseCaseError;

    const NAME: &'static str = "GetEvent";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        match ctx.store.find(&self.event_id).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(UseCaseError::NotFound(self.event_id)),
            Err(_) => Err(UseCaseError::StorageError),
        }
    }
}
