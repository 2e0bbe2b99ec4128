use super::{notification_channel, ChangeNotification, ChangeSet, CommitResult, IEventRepo};
use crate::repos::shared::inmemory_repo::*;
use countdown_domain::{Event, ID};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex, MutexGuard,
};
use tokio::sync::broadcast;

/// Ephemeral event backend. Several `EventStore`s may share one instance
/// to behave like devices syncing through the same replicated store.
pub struct InMemoryEventRepo {
    events: Mutex<Vec<Event>>,
    notifications: broadcast::Sender<ChangeNotification>,
    commits: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            notifications: notification_channel(),
            commits: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Number of commits that reached this backend
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes every following operation fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn events(&self) -> anyhow::Result<MutexGuard<'_, Vec<Event>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("In memory event store is unavailable");
        }
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("In memory event store lock is poisoned"))
    }

    fn publish(&self, origin: &ID) {
        // No subscribers is fine
        let _ = self.notifications.send(ChangeNotification {
            origin: Some(*origin),
        });
    }
}

impl Default for InMemoryEventRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<Event>> {
        let events = self.events()?;
        Ok(find(event_id, &events))
    }

    async fn find_all_ordered_by_due(&self) -> anyhow::Result<Vec<Event>> {
        let events = self.events()?;
        let mut res = find_by(&events, |_| true);
        res.sort_by_key(|e| (e.due_ts, e.id));
        Ok(res)
    }

    async fn commit(&self, changes: &ChangeSet, origin: &ID) -> anyhow::Result<CommitResult> {
        let mut events = self.events()?;

        // Work on a copy so that a failing insert does not leave a partial commit behind
        let mut next = events.clone();
        for e in &changes.inserts {
            insert(e, &mut next)?;
        }
        let mut stale = Vec::new();
        for e in &changes.updates {
            let mut updated = e.clone();
            updated.version = e.version + 1;
            if !save_if(&updated, &mut next, |current| current.version == e.version) {
                stale.push(e.id);
            }
        }
        for e in &changes.deletes {
            match find(&e.id, &next) {
                Some(current) if current.version != e.version => stale.push(e.id),
                Some(_) => {
                    delete(&e.id, &mut next);
                }
                None => {}
            }
        }
        *events = next;
        drop(events);

        self.commits.fetch_add(1, Ordering::SeqCst);
        self.publish(origin);
        Ok(CommitResult { stale })
    }

    async fn delete_all(&self, origin: &ID) -> anyhow::Result<u64> {
        let mut events = self.events()?;
        let deleted = find_and_delete_by(&mut events, |_| true);
        drop(events);

        self.commits.fetch_add(1, Ordering::SeqCst);
        self.publish(origin);
        Ok(deleted.len() as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.notifications.subscribe()
    }

    fn is_ephemeral(&self) -> bool {
        true
    }
}
