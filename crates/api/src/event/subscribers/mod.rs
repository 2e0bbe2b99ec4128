use super::{create_event::CreateEventUseCase, update_event::UpdateEventUseCase};
use crate::shared::usecase::Subscriber;
use countdown_domain::Event;
use countdown_infra::CountdownContext;
use tracing::debug;

/// An event written with a due time that already passed would otherwise wait
/// for the next bulk refresh before it is deleted or rolled forward.
pub struct SignalEndedOnOverdueEvent;

fn signal_if_overdue(e: &Event, ctx: &CountdownContext) {
    if e.is_overdue(ctx.sys.get_timestamp_millis()) && !ctx.store.signal_ended(&e.id) {
        debug!("No listener for ended event: {}", e.id);
    }
}

#[async_trait::async_trait]
impl Subscriber<CreateEventUseCase> for SignalEndedOnOverdueEvent {
    async fn notify(&self, e: &Event, ctx: &CountdownContext) {
        signal_if_overdue(e, ctx);
    }
}

#[async_trait::async_trait]
impl Subscriber<UpdateEventUseCase> for SignalEndedOnOverdueEvent {
    async fn notify(&self, e: &Event, ctx: &CountdownContext) {
        signal_if_overdue(e, ctx);
    }
}
