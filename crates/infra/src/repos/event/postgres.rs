use super::{notification_channel, ChangeNotification, ChangeSet, CommitResult, IEventRepo};
use countdown_domain::{CalendarUnit, Event, ID};
use sqlx::{
    postgres::{PgListener, PgPool},
    types::Uuid,
    FromRow, PgConnection,
};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, warn};

pub const EVENTS_CHANGED_CHANNEL: &str = "countdown_events_changed";

pub struct PostgresEventRepo {
    pool: PgPool,
    notifications: broadcast::Sender<ChangeNotification>,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            notifications: notification_channel(),
        }
    }

    /// Forwards change notifications from the database to subscribers.
    /// Commits from other processes are only seen once this is running.
    pub async fn listen(&self) -> anyhow::Result<()> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(EVENTS_CHANGED_CHANNEL).await?;
        let sender = self.notifications.clone();

        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let origin = notification.payload().parse::<ID>().ok();
                        let _ = sender.send(ChangeNotification { origin });
                    }
                    Err(e) => {
                        // Notifications may have been missed while reconnecting
                        warn!("Lost connection to event change notifications: {:?}", e);
                        let _ = sender.send(ChangeNotification { origin: None });
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    name: String,
    due_ts: i64,
    color_hex: String,
    is_recurring: bool,
    recurrence_interval: Option<i64>,
    recurrence_unit: Option<String>,
    components: Option<Vec<u8>>,
    version: i64,
    created: i64,
    updated: i64,
}

impl From<EventRaw> for Event {
    fn from(raw: EventRaw) -> Self {
        let event_uid = raw.event_uid;
        let recurrence_unit = raw
            .recurrence_unit
            .and_then(|unit| match unit.parse::<CalendarUnit>() {
                Ok(unit) => Some(unit),
                Err(e) => {
                    error!("Stored event: {} has {}", event_uid, e);
                    None
                }
            });
        Event {
            id: event_uid.into(),
            name: raw.name,
            due_ts: raw.due_ts,
            color_hex: raw.color_hex,
            is_recurring: raw.is_recurring,
            recurrence_interval: raw.recurrence_interval,
            recurrence_unit,
            components: raw.components,
            version: raw.version,
            created: raw.created,
            updated: raw.updated,
        }
    }
}

async fn set_origin(conn: &mut PgConnection, origin: &ID) -> anyhow::Result<()> {
    sqlx::query("SELECT set_config('countdown.origin', $1, true)")
        .bind(origin.as_string())
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_event(conn: &mut PgConnection, e: &Event) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO events(
            event_uid,
            name,
            due_ts,
            color_hex,
            is_recurring,
            recurrence_interval,
            recurrence_unit,
            components,
            version,
            created,
            updated
        )
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(e.id.inner())
    .bind(&e.name)
    .bind(e.due_ts)
    .bind(&e.color_hex)
    .bind(e.is_recurring)
    .bind(e.recurrence_interval)
    .bind(e.recurrence_unit.map(|unit| unit.as_str()))
    .bind(&e.components)
    .bind(e.version)
    .bind(e.created)
    .bind(e.updated)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<Event>> {
        let event = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner())
        .fetch_optional(&self.pool)
        .await?;
        Ok(event.map(Event::from))
    }

    async fn find_all_ordered_by_due(&self) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT * FROM events AS e
            ORDER BY e.due_ts ASC, e.event_uid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(events.into_iter().map(Event::from).collect())
    }

    async fn commit(&self, changes: &ChangeSet, origin: &ID) -> anyhow::Result<CommitResult> {
        let mut tx = self.pool.begin().await?;
        set_origin(&mut tx, origin).await?;

        for e in &changes.inserts {
            insert_event(&mut tx, e).await?;
        }

        let mut stale = Vec::new();
        for e in &changes.updates {
            let res = sqlx::query(
                r#"
                UPDATE events
                SET name = $3,
                due_ts = $4,
                color_hex = $5,
                is_recurring = $6,
                recurrence_interval = $7,
                recurrence_unit = $8,
                components = $9,
                updated = $10,
                version = version + 1
                WHERE event_uid = $1 AND version = $2
                "#,
            )
            .bind(e.id.inner())
            .bind(e.version)
            .bind(&e.name)
            .bind(e.due_ts)
            .bind(&e.color_hex)
            .bind(e.is_recurring)
            .bind(e.recurrence_interval)
            .bind(e.recurrence_unit.map(|unit| unit.as_str()))
            .bind(&e.components)
            .bind(e.updated)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() == 0 {
                stale.push(e.id);
            }
        }

        for e in &changes.deletes {
            let res = sqlx::query(
                r#"
                DELETE FROM events
                WHERE event_uid = $1 AND version = $2
                "#,
            )
            .bind(e.id.inner())
            .bind(e.version)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() > 0 {
                continue;
            }
            // Only stale when the event is still there with another version
            let exists = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(SELECT 1 FROM events WHERE event_uid = $1)
                "#,
            )
            .bind(e.id.inner())
            .fetch_one(&mut *tx)
            .await?;
            if exists {
                stale.push(e.id);
            }
        }

        tx.commit().await?;
        Ok(CommitResult { stale })
    }

    async fn delete_all(&self, origin: &ID) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        set_origin(&mut tx, origin).await?;
        let res = sqlx::query("DELETE FROM events").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(res.rows_affected())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.notifications.subscribe()
    }

    fn is_ephemeral(&self) -> bool {
        false
    }
}
