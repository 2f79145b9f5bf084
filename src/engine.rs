use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    error::{SantaError, SantaResult},
    model::{Event, EventId, NewEvent, Participant, ParticipantId},
    store::EventStore,
};

/// What a participant sees when they open their link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub recipient_name: String,
    pub participant_name: String,
    pub budget_message: String,
    pub event_details: String,
}

/// Creates events and hands out assignments, one reveal per event at a time.
pub struct Engine {
    store: EventStore,
    lifecycle: RwLock<()>,
    locks: StdMutex<HashMap<EventId, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(store: EventStore) -> Self {
        Self {
            store,
            lifecycle: RwLock::new(()),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &EventStore {
        &self.store
    }

    /// Validates the input and replaces any existing event with a fresh one.
    pub async fn create_event<I, S>(&self, names: I, budget_message: &str, event_details: &str) -> SantaResult<Event>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let new_event = NewEvent::parse(names, budget_message, event_details)?;
        let event = Event::new(new_event);

        let _guard = self.lifecycle.write().await;
        self.store.replace_active(&event).await?;
        self.forget_locks();

        info!(event_id = %event.id, participants = event.participants.len(), "created event");
        Ok(event)
    }

    /// Returns the participant's recipient, picking one on the first call.
    pub async fn reveal(&self, participant_id: &ParticipantId) -> SantaResult<Reveal> {
        let _guard = self.lifecycle.read().await;

        let Some(participant) = self.store.get_participant(participant_id).await? else {
            debug!(%participant_id, "reveal for unknown participant");
            return Err(SantaError::NotFound);
        };

        let lock = self.event_lock(participant.event_id);
        let _event_guard = lock.lock().await;

        let Some(mut event) = self.store.get_event(&participant.event_id).await? else {
            return Err(SantaError::NotFound);
        };
        let Some(participant) = event.participant(participant_id).cloned() else {
            return Err(SantaError::NotFound);
        };

        if let Some(recipient_id) = &participant.assigned_to {
            let recipient = event
                .participant(recipient_id)
                .ok_or_else(|| SantaError::DanglingAssignment(recipient_id.clone()))?;
            debug!(%participant_id, "repeat reveal");
            return Ok(Self::reveal_for(&event, &participant, recipient));
        }

        let Some(recipient) = event
            .draw_pool(participant_id)
            .choose(&mut rand::rng())
            .map(|p| (*p).clone())
        else {
            warn!(event_id = %event.id, %participant_id, "no recipient left to assign");
            return Err(SantaError::NoAvailableRecipient);
        };

        let participant = self
            .mutate_participant(&mut event, participant_id, |p| {
                p.assigned_to = Some(recipient.id.clone());
                p.has_revealed = true;
            })
            .await?;

        info!(
            event_id = %event.id,
            revealed = event.revealed_count(),
            total = event.participants.len(),
            "assigned recipient"
        );
        Ok(Self::reveal_for(&event, &participant, &recipient))
    }

    pub async fn status(&self) -> SantaResult<Option<Event>> {
        self.store.active_event().await
    }

    /// Removes the event and every participant record. A no-op when nothing exists.
    pub async fn delete_event(&self) -> SantaResult<()> {
        let _guard = self.lifecycle.write().await;
        if let Some(event) = self.store.delete_all().await? {
            info!(event_id = %event.id, "deleted event");
        }
        self.forget_locks();
        Ok(())
    }

    /// The only way a participant changes: applies `f` to the roster entry and
    /// persists the roster and the individual record together.
    ///
    /// Callers must hold the event's lock.
    async fn mutate_participant<F>(&self, event: &mut Event, id: &ParticipantId, f: F) -> SantaResult<Participant>
    where
        F: FnOnce(&mut Participant),
    {
        let participant = event.participant_mut(id).ok_or(SantaError::NotFound)?;
        f(participant);
        let participant = participant.clone();

        self.store.put_event_and_participant(event, &participant).await?;
        Ok(participant)
    }

    fn event_lock(&self, id: EventId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(id).or_default().clone()
    }

    // only called under the exclusive lifecycle guard, when no reveal holds an event lock
    fn forget_locks(&self) {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn reveal_for(event: &Event, participant: &Participant, recipient: &Participant) -> Reveal {
        Reveal {
            recipient_name: recipient.name.clone(),
            participant_name: participant.name.clone(),
            budget_message: event.budget_message.clone(),
            event_details: event.event_details.clone(),
        }
    }
}
