use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::get_events::*;
use countdown_domain::Event;
use countdown_infra::CountdownContext;

pub async fn get_events_controller(
    query_params: web::Query<QueryParams>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let usecase = GetEventsUseCase {
        overdue: query_params.overdue,
    };

    execute(usecase, &ctx)
        .await
        .map(|events| HttpResponse::Ok().json(APIResponse::new(events)))
        .map_err(|_| CountdownError::InternalError)
}

/// All events, soonest due first
#[derive(Debug)]
pub struct GetEventsUseCase {
    pub overdue: Option<bool>,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for GetEventsUseCase {
    type Response = Vec<Event>;

    type Errors = UseCaseError;

    const NAME: &'static str = "GetEvents";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        let events = ctx
            .store
            .fetch_all_ordered_by_due()
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let now = ctx.sys.get_timestamp_millis();
        Ok(match self.overdue {
            Some(overdue) => events
                .into_iter()
                .filter(|e| e.is_overdue(now) == overdue)
                .collect(),
            None => events,
        })
    }
}
