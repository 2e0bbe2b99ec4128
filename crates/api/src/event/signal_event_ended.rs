use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::signal_event_ended::*;
use countdown_domain::ID;
use countdown_infra::CountdownContext;
use tracing::warn;

fn handle_error(e: UseCaseError) -> CountdownError {
    match e {
        UseCaseError::NotFound(event_id) => CountdownError::NotFound(format!(
            "The event with id: {}, was not found.",
            event_id
        )),
        UseCaseError::StorageError => CountdownError::InternalError,
    }
}

pub async fn signal_event_ended_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let usecase = SignalEventEndedUseCase {
        event_id: path_params.event_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|event_id| HttpResponse::Accepted().json(APIResponse { event_id }))
        .map_err(handle_error)
}

/// A live countdown of the event reached zero. The event is refreshed on
/// its own, independent of any bulk refresh.
#[derive(Debug)]
pub struct SignalEventEndedUseCase {
    pub event_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for SignalEventEndedUseCase {
    type Response = ID;

    type Errors = UseCaseError;

    const NAME: &'static str = "SignalEventEnded";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        match ctx.store.find(&self.event_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(UseCaseError::NotFound(self.event_id)),
            Err(_) => return Err(UseCaseError::StorageError),
        }
        if !ctx.store.signal_ended(&self.event_id) {
            warn!("Nobody is listening for ended events, the bulk refresh will pick it up");
        }
        Ok(self.event_id)
    }
}
