use super::{RefreshError, RefreshState};
use crate::{error::CountdownError, refresh_coordinator::RefreshHandle, shared::usecase::UseCase};
use actix_web::{web, HttpResponse};
use countdown_api_structs::refresh_events::*;
use countdown_domain::{Evaluation, ID};
use countdown_infra::CountdownContext;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub async fn refresh_events_controller(
    refresh: web::Data<RefreshHandle>,
) -> Result<HttpResponse, CountdownError> {
    refresh
        .refresh()
        .await
        .map(|report| HttpResponse::Ok().json(APIResponse {
            report: report.into(),
        }))
        .map_err(CountdownError::from)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    /// Overdue events that were evaluated
    pub evaluated: usize,
    pub rolled_over: Vec<ID>,
    pub deleted: Vec<ID>,
    /// Overdue events that could not be evaluated and were left untouched
    pub failed: Vec<ID>,
    /// Rollovers and deletions skipped because another writer changed the event first
    pub stale: Vec<ID>,
    pub persisted: bool,
}

/// Deletes or rolls forward every overdue event and persists the result
/// in one commit. Runs must not overlap, which the refresh coordinator
/// guarantees by running them one at a time.
#[derive(Debug, Default)]
pub struct RefreshEventsUseCase {
    pub state: Option<Arc<watch::Sender<RefreshState>>>,
}

impl RefreshEventsUseCase {
    fn set_state(&self, state: RefreshState) {
        if let Some(sender) = &self.state {
            sender.send_replace(state);
        }
    }

    async fn refresh(&self, ctx: &CountdownContext) -> Result<RefreshReport, RefreshError> {
        self.set_state(RefreshState::Fetching);
        let mut session = ctx.store.session();
        let events = session.fetch_all_ordered_by_due().await?;

        self.set_state(RefreshState::Evaluating);
        let now = ctx.sys.get_timestamp_millis();
        let mut report = RefreshReport::default();
        for mut event in events.into_iter().filter(|e| e.is_overdue(now)) {
            report.evaluated += 1;
            match event.evaluate(now, ctx.calendar.as_ref()) {
                Ok(Evaluation::Pending) => {}
                Ok(Evaluation::Delete) => {
                    session.delete(&event);
                    report.deleted.push(event.id);
                }
                Ok(Evaluation::RollOver { next_due_ts }) if next_due_ts > event.due_ts => {
                    event.due_ts = next_due_ts;
                    event.updated = now;
                    let event_id = event.id;
                    match session.update(event) {
                        Ok(()) => report.rolled_over.push(event_id),
                        Err(e) => {
                            warn!("Could not roll over event: {}. Error: {}", event_id, e);
                            report.failed.push(event_id);
                        }
                    }
                }
                Ok(Evaluation::RollOver { .. }) => {
                    error!(
                        "Rollover of event: {} did not move its due time forward",
                        event.id
                    );
                    report.failed.push(event.id);
                }
                Err(e) => {
                    warn!("Could not evaluate event: {}. Error: {}", event.id, e);
                    report.failed.push(event.id);
                }
            }
        }

        self.set_state(RefreshState::Persisting);
        let summary = session.save().await?;
        report.persisted = summary.persisted;
        report
            .rolled_over
            .retain(|event_id| !summary.stale.contains(event_id));
        report
            .deleted
            .retain(|event_id| !summary.stale.contains(event_id));
        report.stale = summary.stale;

        if report.persisted {
            info!(
                "Refreshed events. Rolled over: {}, deleted: {}, failed: {}, stale: {}",
                report.rolled_over.len(),
                report.deleted.len(),
                report.failed.len(),
                report.stale.len()
            );
        }
        Ok(report)
    }
}

#[async_trait::async_trait]
impl UseCase for RefreshEventsUseCase {
    type Response = RefreshReport;

    type Errors = RefreshError;

    const NAME: &'static str = "RefreshEvents";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        let res = self.refresh(ctx).await;
        if res.is_err() {
            self.set_state(RefreshState::Failed);
        }
        res
    }
}
