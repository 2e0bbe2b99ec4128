use super::RefreshError;
use crate::shared::usecase::UseCase;
use countdown_domain::{Evaluation, ID};
use countdown_infra::CountdownContext;
use tracing::error;

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Missing, not overdue or already handled by a concurrent refresh
    AlreadyCurrent,
    Deleted,
    RolledOver { next_due_ts: i64 },
}

/// Deletes or rolls forward a single event that just ended and persists
/// it immediately. May run concurrently with a bulk refresh.
#[derive(Debug)]
pub struct RefreshEndedEventUseCase {
    pub event_id: ID,
}

#[async_trait::async_trait]
impl UseCase for RefreshEndedEventUseCase {
    type Response = RefreshOutcome;

    type Errors = RefreshError;

    const NAME: &'static str = "RefreshEndedEvent";

    async fn execute(&mut self, ctx: &CountdownContext) -> Result<Self::Response, Self::Errors> {
        let mut session = ctx.store.session();
        let mut event = match session.find(&self.event_id).await? {
            Some(event) => event,
            None => return Ok(RefreshOutcome::AlreadyCurrent),
        };
        let now = ctx.sys.get_timestamp_millis();
        if !event.is_overdue(now) {
            return Ok(RefreshOutcome::AlreadyCurrent);
        }

        let outcome = match event.evaluate(now, ctx.calendar.as_ref()) {
            Ok(Evaluation::Pending) => RefreshOutcome::AlreadyCurrent,
            Ok(Evaluation::Delete) => {
                session.delete(&event);
                RefreshOutcome::Deleted
            }
            Ok(Evaluation::RollOver { next_due_ts }) => {
                if next_due_ts > event.due_ts {
                    event.due_ts = next_due_ts;
                    event.updated = now;
                    session
                        .update(event)
                        .map_err(|e| RefreshError::InvalidEvent(self.event_id, e.to_string()))?;
                }
                RefreshOutcome::RolledOver { next_due_ts }
            }
            Err(e) => return Err(RefreshError::InvalidEvent(self.event_id, e.to_string())),
        };

        if !session.has_changes() {
            error!(
                "Refresh of overdue event: {} produced no change. This is a bug.",
                self.event_id
            );
            return Err(RefreshError::Logic(self.event_id));
        }

        let summary = session.save().await?;
        if summary.stale.contains(&self.event_id) {
            return Ok(RefreshOutcome::AlreadyCurrent);
        }
        Ok(outcome)
    }
}
