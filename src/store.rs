use serde::{Serialize, de::DeserializeOwned};
use sqlx::{
    SqliteConnection, SqlitePool,
    sqlite::SqlitePoolOptions,
};

use crate::{
    error::SantaResult,
    model::{Event, EventId, Participant, ParticipantId},
};

/// Namespaced key/value persistence for events and their participants.
///
/// Every participant lives twice: inside its event's roster and under its own
/// key for the reveal lookup. Keeping the two in step is the engine's job.
#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
    prefix: String,
}

impl EventStore {
    pub async fn connect(url: &str, max_connections: u32, prefix: impl Into<String>) -> SantaResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self::from_pool(pool, prefix))
    }

    pub fn from_pool(pool: SqlitePool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    pub async fn migrate(&self) -> SantaResult<()> {
        sqlx::query(
            "create table if not exists kv(
                key text primary key not null,
                value text not null
            );",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn active_key(&self) -> String {
        format!("{}active", self.prefix)
    }

    fn event_key(&self, id: &EventId) -> String {
        format!("{}event:{id}", self.prefix)
    }

    fn participant_key(&self, id: &ParticipantId) -> String {
        format!("{}participant:{id}", self.prefix)
    }

    pub async fn put_event(&self, event: &Event) -> SantaResult<()> {
        let mut conn = self.pool.acquire().await?;
        write(&mut conn, &self.event_key(&event.id), event).await
    }

    pub async fn get_event(&self, id: &EventId) -> SantaResult<Option<Event>> {
        let mut conn = self.pool.acquire().await?;
        read(&mut conn, &self.event_key(id)).await
    }

    /// The one event currently in play, if any.
    pub async fn active_event(&self) -> SantaResult<Option<Event>> {
        let mut conn = self.pool.acquire().await?;
        self.read_active(&mut conn).await
    }

    pub async fn put_participant(&self, participant: &Participant) -> SantaResult<()> {
        let mut conn = self.pool.acquire().await?;
        write(&mut conn, &self.participant_key(&participant.id), participant).await
    }

    pub async fn get_participant(&self, id: &ParticipantId) -> SantaResult<Option<Participant>> {
        let mut conn = self.pool.acquire().await?;
        read(&mut conn, &self.participant_key(id)).await
    }

    /// Writes the roster copy and the individual record of one participant together.
    pub async fn put_event_and_participant(&self, event: &Event, participant: &Participant) -> SantaResult<()> {
        let mut tx = self.pool.begin().await?;
        write(&mut tx, &self.participant_key(&participant.id), participant).await?;
        write(&mut tx, &self.event_key(&event.id), event).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Drops whatever event is active and makes `event` the active one.
    pub async fn replace_active(&self, event: &Event) -> SantaResult<()> {
        let mut tx = self.pool.begin().await?;
        if let Some(previous) = self.read_active(&mut tx).await? {
            self.remove(&mut tx, &previous).await?;
        }

        write(&mut tx, &self.event_key(&event.id), event).await?;
        for participant in &event.participants {
            write(&mut tx, &self.participant_key(&participant.id), participant).await?;
        }
        write(&mut tx, &self.active_key(), &event.id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes the active event and every participant record it references.
    /// Returns the removed event; `None` when there was nothing to delete.
    pub async fn delete_all(&self) -> SantaResult<Option<Event>> {
        let mut tx = self.pool.begin().await?;
        let previous = self.read_active(&mut tx).await?;
        if let Some(previous) = &previous {
            self.remove(&mut tx, previous).await?;
        }
        delete(&mut tx, &self.active_key()).await?;

        tx.commit().await?;
        Ok(previous)
    }

    async fn read_active(&self, conn: &mut SqliteConnection) -> SantaResult<Option<Event>> {
        let Some(id) = read::<EventId>(conn, &self.active_key()).await? else {
            return Ok(None);
        };
        read(conn, &self.event_key(&id)).await
    }

    async fn remove(&self, conn: &mut SqliteConnection, event: &Event) -> SantaResult<()> {
        for participant in &event.participants {
            delete(conn, &self.participant_key(&participant.id)).await?;
        }
        delete(conn, &self.event_key(&event.id)).await
    }
}

async fn read<T: DeserializeOwned>(conn: &mut SqliteConnection, key: &str) -> SantaResult<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("select value from kv where key = ?")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(value.map(|value| serde_json::from_str(&value)).transpose()?)
}

async fn write<T: Serialize>(conn: &mut SqliteConnection, key: &str, value: &T) -> SantaResult<()> {
    sqlx::query(
        "insert into kv(key, value) values(?, ?)
            on conflict(key) do update set value = excluded.value",
    )
    .bind(key)
    .bind(serde_json::to_string(value)?)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn delete(conn: &mut SqliteConnection, key: &str) -> SantaResult<()> {
    sqlx::query("delete from kv where key = ?")
        .bind(key)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::NewEvent;

    /// A private in-memory database; one connection so every query sees the same data.
    pub(crate) async fn memory_store() -> EventStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = EventStore::from_pool(pool, "secretsanta:");
        store.migrate().await.unwrap();
        store
    }

    fn event(names: &[&str]) -> Event {
        Event::new(NewEvent::parse(names.iter().copied(), "$25", "Potluck").unwrap())
    }

    #[tokio::test]
    async fn empty_store_has_nothing() {
        let store = memory_store().await;
        assert_eq!(store.active_event().await.unwrap(), None);
        assert_eq!(store.get_participant(&"nope".into()).await.unwrap(), None);
        assert_eq!(store.delete_all().await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_active_writes_both_copies() {
        let store = memory_store().await;
        let event = event(&["Alice", "Bob"]);
        store.replace_active(&event).await.unwrap();

        assert_eq!(store.active_event().await.unwrap().as_ref(), Some(&event));
        assert_eq!(store.get_event(&event.id).await.unwrap().as_ref(), Some(&event));
        for p in &event.participants {
            assert_eq!(store.get_participant(&p.id).await.unwrap().as_ref(), Some(p));
        }
    }

    #[tokio::test]
    async fn replace_active_drops_previous_event() {
        let store = memory_store().await;
        let first = event(&["Alice", "Bob"]);
        let second = event(&["Carol", "Dave"]);
        store.replace_active(&first).await.unwrap();
        store.replace_active(&second).await.unwrap();

        assert_eq!(store.active_event().await.unwrap().map(|e| e.id), Some(second.id));
        assert_eq!(store.get_event(&first.id).await.unwrap(), None);
        for p in &first.participants {
            assert_eq!(store.get_participant(&p.id).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn put_event_and_participant_updates_both() {
        let store = memory_store().await;
        let mut event = event(&["Alice", "Bob"]);
        store.replace_active(&event).await.unwrap();

        let bob = event.participants[1].id.clone();
        let alice = &mut event.participants[0];
        alice.assigned_to = Some(bob);
        alice.has_revealed = true;
        let alice = alice.clone();
        store.put_event_and_participant(&event, &alice).await.unwrap();

        assert_eq!(store.get_participant(&alice.id).await.unwrap(), Some(alice.clone()));
        let stored = store.active_event().await.unwrap().unwrap();
        assert_eq!(stored.participant(&alice.id), Some(&alice));
    }

    #[tokio::test]
    async fn delete_all_clears_everything() {
        let store = memory_store().await;
        let event = event(&["Alice", "Bob", "Carol", "Dave"]);
        store.replace_active(&event).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap().map(|e| e.id), Some(event.id));
        assert_eq!(store.active_event().await.unwrap(), None);
        assert_eq!(store.get_event(&event.id).await.unwrap(), None);
        for p in &event.participants {
            assert_eq!(store.get_participant(&p.id).await.unwrap(), None);
        }
        assert_eq!(store.delete_all().await.unwrap(), None);
    }

    #[tokio::test]
    async fn prefixes_keep_stores_apart() {
        let store = memory_store().await;
        let other = EventStore::from_pool(store.pool.clone(), "elsewhere:");
        let event = event(&["Alice", "Bob"]);
        store.replace_active(&event).await.unwrap();

        assert_eq!(other.active_event().await.unwrap(), None);
        assert_eq!(other.delete_all().await.unwrap(), None);
        assert!(store.active_event().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn single_records_round_trip() {
        let store = memory_store().await;
        let event = event(&["Alice", "Bob"]);
        store.put_event(&event).await.unwrap();
        store.put_participant(&event.participants[0]).await.unwrap();

        assert_eq!(store.get_event(&event.id).await.unwrap(), Some(event.clone()));
        assert_eq!(
            store.get_participant(&event.participants[0].id).await.unwrap().as_ref(),
            Some(&event.participants[0])
        );
        // not activated
        assert_eq!(store.active_event().await.unwrap(), None);
    }
}
