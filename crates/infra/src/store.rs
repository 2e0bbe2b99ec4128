use crate::repos::{ChangeNotification, ChangeSet, IEventRepo};
use countdown_domain::{Event, InvalidEventError, ID};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Event store failed: {0}")]
    Persistence(String),
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] InvalidEventError),
    #[error("Event with id: {0} was modified by another writer")]
    StaleWrite(ID),
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        Self::Persistence(format!("{:#}", e))
    }
}

/// Someone observed that the event reached its due time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventEnded {
    pub event_id: ID,
}

/// The store was changed by another writer and should be queried again
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteChange;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSummary {
    /// Whether anything was sent to the backend
    pub persisted: bool,
    /// Updates skipped because a concurrent writer changed the event first
    pub stale: Vec<ID>,
}

/// Handle to the canonical event collection. Clones share the same origin,
/// separate `EventStore::new` calls act as separate writers.
#[derive(Clone)]
pub struct EventStore {
    repo: Arc<dyn IEventRepo>,
    origin: ID,
    ended: broadcast::Sender<EventEnded>,
}

impl EventStore {
    pub fn new(repo: Arc<dyn IEventRepo>) -> Self {
        let (ended, _) = broadcast::channel(256);
        Self {
            repo,
            origin: ID::new(),
            ended,
        }
    }

    pub fn origin(&self) -> &ID {
        &self.origin
    }

    pub fn is_ephemeral(&self) -> bool {
        self.repo.is_ephemeral()
    }

    /// Opens a unit of work. Nothing reaches the backend before `save`.
    pub fn session(&self) -> StoreSession {
        StoreSession {
            store: self.clone(),
            staged: ChangeSet::default(),
        }
    }

    pub async fn find(&self, event_id: &ID) -> Result<Option<Event>, StoreError> {
        Ok(self.repo.find(event_id).await?)
    }

    pub async fn fetch_all_ordered_by_due(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.repo.find_all_ordered_by_due().await?)
    }

    pub async fn create(&self, event: Event) -> Result<Event, StoreError> {
        let mut session = self.session();
        session.create(event.clone())?;
        session.save().await?;
        Ok(event)
    }

    /// Writes `event` if nobody else changed it since it was read
    pub async fn update(&self, event: Event) -> Result<Event, StoreError> {
        let mut session = self.session();
        session.update(event.clone())?;
        let summary = session.save().await?;
        if summary.stale.contains(&event.id) {
            return Err(StoreError::StaleWrite(event.id));
        }
        let mut event = event;
        event.version += 1;
        Ok(event)
    }

    /// Deleting an event that does not exist is not an error. Fails with
    /// `StaleWrite` when another writer changed the event while deleting it.
    pub async fn delete(&self, event_id: &ID) -> Result<Option<Event>, StoreError> {
        let mut session = self.session();
        let event = match session.find(event_id).await? {
            Some(event) => event,
            None => return Ok(None),
        };
        session.delete(&event);
        let summary = session.save().await?;
        if summary.stale.contains(event_id) {
            return Err(StoreError::StaleWrite(*event_id));
        }
        Ok(Some(event))
    }

    pub async fn delete_all(&self) -> Result<u64, StoreError> {
        Ok(self.repo.delete_all(&self.origin).await?)
    }

    /// Changes committed by other writers
    pub fn remote_changes(&self) -> RemoteChanges {
        RemoteChanges {
            receiver: self.repo.subscribe(),
            origin: self.origin,
        }
    }

    /// Every committed change, local or remote
    pub fn changes(&self) -> broadcast::Receiver<ChangeNotification> {
        self.repo.subscribe()
    }

    /// Returns false when nobody is listening for ended events
    pub fn signal_ended(&self, event_id: &ID) -> bool {
        self.ended
            .send(EventEnded {
                event_id: *event_id,
            })
            .is_ok()
    }

    pub fn ended_signals(&self) -> broadcast::Receiver<EventEnded> {
        self.ended.subscribe()
    }
}

pub struct RemoteChanges {
    receiver: broadcast::Receiver<ChangeNotification>,
    origin: ID,
}

impl RemoteChanges {
    /// Waits for the next change made by another writer. Returns `None`
    /// once the backend stops publishing.
    pub async fn recv(&mut self) -> Option<RemoteChange> {
        loop {
            match self.receiver.recv().await {
                Ok(ChangeNotification { origin: Some(origin) }) if origin == self.origin => {
                    continue
                }
                Ok(_) => return Some(RemoteChange),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Skipped {} change notifications", skipped);
                    return Some(RemoteChange);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Unit of work over the `EventStore`. Reads see the staged changes.
pub struct StoreSession {
    store: EventStore,
    staged: ChangeSet,
}

impl StoreSession {
    fn overlay(&self, event: Event) -> Option<Event> {
        if self.staged.deletes.iter().any(|e| e.id == event.id) {
            return None;
        }
        let staged = self
            .staged
            .updates
            .iter()
            .chain(self.staged.inserts.iter())
            .find(|e| e.id == event.id);
        Some(staged.cloned().unwrap_or(event))
    }

    pub async fn find(&self, event_id: &ID) -> Result<Option<Event>, StoreError> {
        if let Some(e) = self.staged.inserts.iter().find(|e| e.id == *event_id) {
            return Ok(Some(e.clone()));
        }
        let event = self.store.find(event_id).await?;
        Ok(event.and_then(|e| self.overlay(e)))
    }

    pub async fn fetch_all_ordered_by_due(&self) -> Result<Vec<Event>, StoreError> {
        let mut events = self
            .store
            .fetch_all_ordered_by_due()
            .await?
            .into_iter()
            .filter_map(|e| self.overlay(e))
            .collect::<Vec<_>>();
        events.extend(self.staged.inserts.iter().cloned());
        events.sort_by_key(|e| (e.due_ts, e.id));
        Ok(events)
    }

    pub fn create(&mut self, event: Event) -> Result<(), StoreError> {
        event.validate()?;
        self.staged.inserts.push(event);
        Ok(())
    }

    pub fn update(&mut self, event: Event) -> Result<(), StoreError> {
        event.validate()?;
        if let Some(staged) = self.staged.inserts.iter_mut().find(|e| e.id == event.id) {
            *staged = event;
            return Ok(());
        }
        self.staged.updates.retain(|e| e.id != event.id);
        self.staged.updates.push(event);
        Ok(())
    }

    /// Deletes `event` unless another writer changed it since it was read
    pub fn delete(&mut self, event: &Event) {
        let staged_inserts = self.staged.inserts.len();
        self.staged.inserts.retain(|e| e.id != event.id);
        self.staged.updates.retain(|e| e.id != event.id);
        let already_staged = self.staged.deletes.iter().any(|e| e.id == event.id);
        if staged_inserts == self.staged.inserts.len() && !already_staged {
            self.staged.deletes.push(event.clone());
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Commits every staged change at once. A session without changes
    /// does not touch the backend.
    pub async fn save(&mut self) -> Result<SaveSummary, StoreError> {
        if !self.has_changes() {
            return Ok(SaveSummary::default());
        }
        let staged = std::mem::take(&mut self.staged);
        let res = self.store.repo.commit(&staged, &self.store.origin).await?;
        for event_id in &res.stale {
            warn!(
                "Skipped write of event: {} as it was changed by another writer",
                event_id
            );
        }
        Ok(SaveSummary {
            persisted: true,
            stale: res.stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::InMemoryEventRepo;
    use countdown_domain::CalendarUnit;

    fn setup() -> (Arc<InMemoryEventRepo>, EventStore) {
        let repo = Arc::new(InMemoryEventRepo::new());
        let store = EventStore::new(repo.clone());
        (repo, store)
    }

    fn generate_event(due_ts: i64) -> Event {
        Event::new("Launch", due_ts, "#123456", 0)
    }

    #[tokio::test]
    async fn session_reads_its_own_staged_changes() {
        let (repo, store) = setup();
        let existing = store.create(generate_event(20)).await.unwrap();

        let mut session = store.session();
        let fresh = generate_event(10);
        session.create(fresh.clone()).unwrap();
        let mut renamed = existing.clone();
        renamed.name = "Renamed".into();
        session.update(renamed).unwrap();

        let events = session.fetch_all_ordered_by_due().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, fresh.id);
        assert_eq!(events[1].name, "Renamed");
        // Nothing reached the backend yet
        assert_eq!(store.fetch_all_ordered_by_due().await.unwrap().len(), 1);
        assert_eq!(repo.commit_count(), 1);

        session.delete(&existing);
        assert_eq!(session.find(&existing.id).await.unwrap(), None);
        session.save().await.unwrap();
        let events = store.fetch_all_ordered_by_due().await.unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![fresh.id]);
        assert_eq!(repo.commit_count(), 2);
    }

    #[tokio::test]
    async fn saving_without_changes_is_a_noop() {
        let (repo, store) = setup();
        let mut session = store.session();
        assert!(!session.has_changes());
        assert_eq!(session.save().await.unwrap(), SaveSummary::default());
        assert_eq!(repo.commit_count(), 0);
    }

    #[tokio::test]
    async fn rejects_invalid_events() {
        let (repo, store) = setup();
        let mut event = generate_event(10).with_recurrence(1, CalendarUnit::Day);
        event.recurrence_interval = Some(0);
        assert!(matches!(
            store.create(event).await,
            Err(StoreError::InvalidEvent(_))
        ));
        assert!(matches!(
            store.create(generate_event(i64::MIN)).await,
            Err(StoreError::InvalidEvent(_))
        ));
        assert_eq!(repo.commit_count(), 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, store) = setup();
        let event = store.create(generate_event(10)).await.unwrap();
        assert_eq!(store.delete(&event.id).await.unwrap(), Some(event.clone()));
        assert_eq!(store.delete(&event.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_update_is_reported_stale() {
        let (_, store) = setup();
        let event = store.create(generate_event(10)).await.unwrap();

        let mut first = event.clone();
        first.due_ts = 100;
        let mut second = event.clone();
        second.due_ts = 200;

        let first = store.update(first).await.unwrap();
        assert_eq!(first.version, 1);
        assert!(matches!(
            store.update(second).await,
            Err(StoreError::StaleWrite(id)) if id == event.id
        ));
        assert_eq!(store.find(&event.id).await.unwrap().unwrap().due_ts, 100);
    }

    #[tokio::test]
    async fn delete_of_event_rescheduled_meanwhile_is_reported_stale() {
        let (_, store) = setup();
        let event = store.create(generate_event(10)).await.unwrap();
        let mut session = store.session();
        let read = session.find(&event.id).await.unwrap().unwrap();

        // The user reschedules the event while the session holds the old version
        let mut rescheduled = event.clone().with_recurrence(1, CalendarUnit::Day);
        rescheduled.due_ts = 10 + 1000 * 60 * 60 * 24;
        store.update(rescheduled).await.unwrap();

        session.delete(&read);
        let summary = session.save().await.unwrap();

        assert_eq!(summary.stale, vec![event.id]);
        let stored = store.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.due_ts, 10 + 1000 * 60 * 60 * 24);
        assert!(stored.is_recurring);
        assert!(matches!(
            store.delete(&event.id).await,
            Ok(Some(deleted)) if deleted.version == 1
        ));
    }

    #[tokio::test]
    async fn persistence_errors_propagate() {
        let (repo, store) = setup();
        repo.set_unavailable(true);
        assert!(matches!(
            store.create(generate_event(10)).await,
            Err(StoreError::Persistence(_))
        ));
        assert!(matches!(
            store.fetch_all_ordered_by_due().await,
            Err(StoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn remote_changes_skip_own_commits() {
        let repo = Arc::new(InMemoryEventRepo::new());
        let device_a = EventStore::new(repo.clone());
        let device_b = EventStore::new(repo.clone());
        let mut remote_a = device_a.remote_changes();
        let mut all_a = device_a.changes();

        device_a.create(generate_event(10)).await.unwrap();
        device_b.create(generate_event(20)).await.unwrap();

        // Only the commit of device b is remote for device a
        assert_eq!(remote_a.recv().await, Some(RemoteChange));
        assert!(all_a.recv().await.is_ok());
        assert!(all_a.recv().await.is_ok());
        assert!(matches!(
            all_a.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn ended_signals_carry_the_event_id() {
        let (_, store) = setup();
        let event_id = ID::new();
        assert!(!store.signal_ended(&event_id));

        let mut signals = store.ended_signals();
        assert!(store.clone().signal_ended(&event_id));
        assert_eq!(signals.recv().await.unwrap(), EventEnded { event_id });
    }
}
