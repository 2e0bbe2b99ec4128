mod refresh_ended_event;
mod refresh_events;

use actix_web::web;
use countdown_api_structs::dtos::RefreshReportDTO;
use countdown_domain::ID;
use countdown_infra::StoreError;
pub use refresh_ended_event::RefreshEndedEventUseCase;
pub use refresh_events::{RefreshEventsUseCase, RefreshReport};
use refresh_events::refresh_events_controller;
use thiserror::Error;

/// Progress of a bulk refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshState {
    Idle,
    Fetching,
    Evaluating,
    Persisting,
    Failed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    #[error("Event store failed during refresh: {0}")]
    Persistence(String),
    #[error("Event: {0} could not be evaluated: {1}")]
    InvalidEvent(ID, String),
    /// The evaluation of an overdue event did not produce any change to persist
    #[error("Refresh of overdue event: {0} produced no change")]
    Logic(ID),
    #[error("Refresh coordinator is not running")]
    Stopped,
}

impl From<StoreError> for RefreshError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<RefreshReport> for RefreshReportDTO {
    fn from(report: RefreshReport) -> Self {
        Self {
            evaluated: report.evaluated,
            rolled_over: report.rolled_over,
            deleted: report.deleted,
            failed: report.failed,
            stale: report.stale,
            persisted: report.persisted,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/events/refresh", web::post().to(refresh_events_controller));
}

#[cfg(test)]
mod test {
    use super::refresh_ended_event::RefreshOutcome;
    use super::*;
    use crate::shared::usecase::UseCase;
    use countdown_domain::{CalendarUnit, Event};
    use countdown_infra::{
        ChangeNotification, ChangeSet, CommitResult, CountdownContext, EventStore, FixedSys,
        IEventRepo, InMemoryEventRepo,
    };
    use std::sync::Arc;
    use tokio::sync::{broadcast, Notify};

    const HOUR: i64 = 1000 * 60 * 60;
    const DAY: i64 = HOUR * 24;
    const NOW: i64 = 1656331200000;

    /// Holds back every commit until released, so that another writer can
    /// commit in between the read and the write of a refresh
    struct HeldCommits {
        inner: Arc<InMemoryEventRepo>,
        arrived: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl IEventRepo for HeldCommits {
        async fn find(&self, event_id: &ID) -> anyhow::Result<Option<Event>> {
            self.inner.find(event_id).await
        }

        async fn find_all_ordered_by_due(&self) -> anyhow::Result<Vec<Event>> {
            self.inner.find_all_ordered_by_due().await
        }

        async fn commit(&self, changes: &ChangeSet, origin: &ID) -> anyhow::Result<CommitResult> {
            self.arrived.notify_one();
            self.release.notified().await;
            self.inner.commit(changes, origin).await
        }

        async fn delete_all(&self, origin: &ID) -> anyhow::Result<u64> {
            self.inner.delete_all(origin).await
        }

        fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
            self.inner.subscribe()
        }

        fn is_ephemeral(&self) -> bool {
            true
        }
    }

    /// Two writers on the same events. Commits of the second one are held back.
    fn setup() -> (CountdownContext, CountdownContext, Arc<HeldCommits>) {
        let repo = Arc::new(InMemoryEventRepo::new());
        let mut free = CountdownContext::create_inmemory_shared(repo.clone());
        free.sys = Arc::new(FixedSys::new(NOW));

        let held = Arc::new(HeldCommits {
            inner: repo,
            arrived: Notify::new(),
            release: Notify::new(),
        });
        let mut held_ctx = free.clone();
        held_ctx.store = EventStore::new(held.clone());
        (free, held_ctx, held)
    }

    async fn create_daily_event(ctx: &CountdownContext, due: i64) -> Event {
        ctx.store
            .create(Event::new("Standup", due, "#000000", 0).with_recurrence(1, CalendarUnit::Day))
            .await
            .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn ended_refresh_losing_to_bulk_refresh_is_already_current() {
        let (free, held_ctx, held) = setup();
        let due = NOW - HOUR;
        let event = create_daily_event(&free, due).await;

        let event_id = event.id;
        let ended = tokio::spawn(async move {
            let mut usecase = RefreshEndedEventUseCase { event_id };
            usecase.execute(&held_ctx).await
        });
        // The ended refresh has read the event and is about to commit
        held.arrived.notified().await;
        let report = RefreshEventsUseCase::default().execute(&free).await.unwrap();
        held.release.notify_one();
        let outcome = ended.await.unwrap();

        assert_eq!(report.rolled_over, vec![event.id]);
        assert!(report.stale.is_empty());
        assert_eq!(outcome, Ok(RefreshOutcome::AlreadyCurrent));
        let stored = free.store.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.due_ts, due + DAY);
        assert_eq!(stored.version, 1);
    }

    #[actix_web::main]
    #[test]
    async fn bulk_refresh_losing_to_ended_refresh_reports_stale() {
        let (free, held_ctx, held) = setup();
        let due = NOW - HOUR;
        let event = create_daily_event(&free, due).await;

        let bulk = tokio::spawn(async move {
            RefreshEventsUseCase::default().execute(&held_ctx).await
        });
        held.arrived.notified().await;
        let mut ended = RefreshEndedEventUseCase { event_id: event.id };
        assert_eq!(
            ended.execute(&free).await,
            Ok(RefreshOutcome::RolledOver {
                next_due_ts: due + DAY
            })
        );
        held.release.notify_one();
        let report = bulk.await.unwrap().unwrap();

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.stale, vec![event.id]);
        assert!(report.rolled_over.is_empty());
        assert!(report.persisted);
        let stored = free.store.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.due_ts, due + DAY);
        assert_eq!(stored.version, 1);
    }

    #[actix_web::main]
    #[test]
    async fn bulk_refresh_keeps_event_rescheduled_while_running() {
        let (free, held_ctx, held) = setup();
        let event = free
            .store
            .create(Event::new("Dentist", NOW - HOUR, "#000000", 0))
            .await
            .unwrap();

        let bulk = tokio::spawn(async move {
            RefreshEventsUseCase::default().execute(&held_ctx).await
        });
        held.arrived.notified().await;
        let mut rescheduled = event.clone();
        rescheduled.due_ts = NOW + DAY;
        free.store.update(rescheduled).await.unwrap();
        held.release.notify_one();
        let report = bulk.await.unwrap().unwrap();

        assert!(report.deleted.is_empty());
        assert_eq!(report.stale, vec![event.id]);
        let stored = free.store.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.due_ts, NOW + DAY);
    }
}
