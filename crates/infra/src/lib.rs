mod config;
mod repos;
mod store;
mod system;

pub use config::Config;
use countdown_domain::{CalendarDateProvider, DateProvider};
use repos::Repos;
pub use repos::{
    ChangeNotification, ChangeSet, CommitResult, IEventRepo, InMemoryEventRepo,
    PostgresEventRepo,
};
use std::sync::Arc;
pub use store::{
    EventEnded, EventStore, RemoteChange, RemoteChanges, SaveSummary, StoreError, StoreSession,
};
pub use system::{FixedSys, ISys, RealSys};

#[derive(Clone)]
pub struct CountdownContext {
    pub store: EventStore,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    /// Calendar used to roll recurring events forward
    pub calendar: Arc<dyn DateProvider>,
}

impl CountdownContext {
    fn create(repos: Repos, config: Config) -> Self {
        let calendar = CalendarDateProvider::new(config.timezone);
        Self {
            store: EventStore::new(repos.events),
            config,
            sys: Arc::new(RealSys {}),
            calendar: Arc::new(calendar),
        }
    }

    pub fn create_inmemory() -> Self {
        Self::create(Repos::create_inmemory(), Config::new())
    }

    /// New writer on an existing in memory backend
    pub fn create_inmemory_shared(events: Arc<InMemoryEventRepo>) -> Self {
        Self::create(Repos::with_inmemory(events), Config::new())
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<CountdownContext> {
    let config = Config::new();
    let repos = match &config.database_url {
        Some(url) => Repos::create_postgres(url).await?,
        None => Repos::create_inmemory(),
    };
    Ok(CountdownContext::create(repos, config))
}
