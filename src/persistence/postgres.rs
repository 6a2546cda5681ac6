//! PostgreSQL implementation of the keyed event store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::EventStore;
use super::schema::{CREATE_MATCH_EVENTS_TABLE, UPSERT_MATCH_EVENT};
use crate::domain::{EventId, EventType, MatchEvent, StoredItem};
use crate::error::StorageError;

type MatchEventRow = (String, String, String, String, String, String, Option<String>);

/// PostgreSQL-backed event store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyedStore`] if the database is unreachable.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the table and index if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyedStore`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(CREATE_MATCH_EVENTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn upsert(&self, item: &StoredItem) -> Result<(), StorageError> {
        let event = &item.event;
        sqlx::query(UPSERT_MATCH_EVENT)
            .bind(event.event_id.as_str())
            .bind(&event.match_id)
            .bind(event.event_type.as_str())
            .bind(&event.team)
            .bind(&event.player)
            .bind(&event.timestamp)
            .bind(item.season.as_deref())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, event_id: &EventId) -> Result<Option<StoredItem>, StorageError> {
        let row = sqlx::query_as::<_, MatchEventRow>(
            "SELECT event_id, match_id, event_type, team, player, timestamp, season \
             FROM match_events WHERE event_id = $1",
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some((event_id, match_id, event_type, team, player, timestamp, season)) = row else {
            return Ok(None);
        };
        let event_type: EventType = event_type
            .parse()
            .map_err(|e| StorageError::KeyedStore(format!("corrupt row {event_id}: {e}")))?;
        Ok(Some(StoredItem {
            event: MatchEvent {
                event_id: EventId::from(event_id),
                match_id,
                event_type,
                team,
                player,
                timestamp,
            },
            season,
        }))
    }

    async fn count_by_match_and_type(
        &self,
        match_id: &str,
        event_type: &str,
    ) -> Result<u64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM match_events WHERE match_id = $1 AND event_type = $2",
        )
        .bind(match_id)
        .bind(event_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
