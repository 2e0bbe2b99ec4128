use crate::{
    error::CountdownError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use countdown_api_structs::seed_sample_events::*;
use countdown_domain::{Event, SampleEventGenerator};
use countdown_infra::CountdownContext;

fn handle_error(e: UseCaseError) -> CountdownError {
    match e {
        UseCaseError::DurableStore => CountdownError::Conflict(
            "Sample events can only be seeded into an in memory store".into(),
        ),
        UseCaseError::StorageError => CountdownError::InternalError,
    }
}

pub async fn seed_sample_events_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<CountdownContext>,
) -> Result<HttpResponse, CountdownError> {
    let usecase = SeedSampleEventsUseCase {
        count: body.count,
        seed: body.seed,
    };

    execute(usecase, &ctx)
        .await
        .map(|events| HttpResponse::Created().json(APIResponse::new(events)))
        .map_err(handle_error)
}

/// Fills an ephemeral store with preview events
#[derive(Debug)]
pub struct SeedSampleEventsUseCase {
    pub count: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    DurableStore,
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for SeedSampleEventsUseCase {
    type Response = Vec<Event>;

    type Errors = UseCaseError;

    const NAME: &'static str = "SeedSampleEvents";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        if !ctx.store.is_ephemeral() {
            return Err(UseCaseError::DurableStore);
        }

        let now = ctx.sys.get_timestamp_millis();
        let events =
            SampleEventGenerator::new(self.seed).generate(self.count, now, ctx.calendar.as_ref());

        let mut session = ctx.store.session();
        for e in &events {
            session
                .create(e.clone())
                .map_err(|_| UseCaseError::StorageError)?;
        }
        session
            .save()
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(events)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[actix_web::main]
    #[test]
    async fn seeds_in_a_single_commit() {
        let ctx = CountdownContext::create_inmemory();
        let mut changes = ctx.store.changes();
        let mut usecase = SeedSampleEventsUseCase {
            count: 5,
            seed: Some(1),
        };

        let events = usecase.execute(&ctx).await.unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(ctx.store.fetch_all_ordered_by_due().await.unwrap().len(), 5);
        assert!(changes.recv().await.is_ok());
        assert!(changes.try_recv().is_err());
    }

    #[actix_web::main]
    #[test]
    async fn seeding_nothing_does_not_persist() {
        let ctx = CountdownContext::create_inmemory();
        let mut changes = ctx.store.changes();
        let mut usecase = SeedSampleEventsUseCase {
            count: 0,
            seed: None,
        };

        assert_eq!(usecase.execute(&ctx).await, Ok(Vec::new()));
        assert!(changes.try_recv().is_err());
    }
}
