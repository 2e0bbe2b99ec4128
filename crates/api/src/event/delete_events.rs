use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::delete_events::*;
use countdown_infra::CountdownContext;

pub async fn delete_events_controller(
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    execute(DeleteEventsUseCase, &ctx)
        .await
        .map(|deleted_count| HttpResponse::Ok().json(APIResponse { deleted_count }))
        .map_err(|_| CountdownError::InternalError)
}

#[derive(Debug)]
pub struct DeleteEventsUseCase;

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for DeleteEventsUseCase {
    /// Number of deleted events
    type Response = u64;

    type Errors = UseCaseError;

    const NAME: &'static str = "DeleteEvents";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        ctx.store
            .delete_all()
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}
