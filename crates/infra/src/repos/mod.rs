mod event;
mod shared;

pub use event::{
    ChangeNotification, ChangeSet, CommitResult, IEventRepo, InMemoryEventRepo,
    PostgresEventRepo,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub events: Arc<dyn IEventRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        info!("DB EXECUTING MIGRATION ...");
        sqlx::migrate!().run(&pool).await?;
        info!("DB EXECUTING MIGRATION ... [done]");

        let events = PostgresEventRepo::new(pool);
        events.listen().await?;
        Ok(Self {
            events: Arc::new(events),
        })
    }

    pub fn create_inmemory() -> Self {
        Self::with_inmemory(Arc::new(InMemoryEventRepo::new()))
    }

    /// Shares an existing in memory backend, e.g. to emulate several devices
    pub fn with_inmemory(events: Arc<InMemoryEventRepo>) -> Self {
        Self { events }
    }
}
