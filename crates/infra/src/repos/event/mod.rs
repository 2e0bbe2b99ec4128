mod inmemory;
mod postgres;

use countdown_domain::{Event, ID};
pub use inmemory::InMemoryEventRepo;
pub use postgres::PostgresEventRepo;
use tokio::sync::broadcast;

/// Writes staged by a unit of work and committed together
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub inserts: Vec<Event>,
    /// Updated events carrying the `version` they were read with
    pub updates: Vec<Event>,
    /// Deleted events carrying the `version` they were read with
    pub deletes: Vec<Event>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitResult {
    /// Updates and deletes rejected because another writer got there first
    pub stale: Vec<ID>,
}

/// Published after every commit that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    /// Writer of the commit, `None` when it could not be determined
    pub origin: Option<ID>,
}

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<Event>>;
    async fn find_all_ordered_by_due(&self) -> anyhow::Result<Vec<Event>>;
    /// Applies the whole change set or nothing. Updates and deletes are
    /// compare and swap on `version`, deleting a missing event is a no-op.
    async fn commit(&self, changes: &ChangeSet, origin: &ID) -> anyhow::Result<CommitResult>;
    async fn delete_all(&self, origin: &ID) -> anyhow::Result<u64>;
    fn subscribe(&self) -> broadcast::Receiver<ChangeNotification>;
    /// Whether the data is lost when the process exits
    fn is_ephemeral(&self) -> bool;
}

const NOTIFICATION_CAPACITY: usize = 256;

fn notification_channel() -> broadcast::Sender<ChangeNotification> {
    let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
    sender
}
