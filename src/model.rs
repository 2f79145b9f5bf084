use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reveal-link key. Random, so holding the link is the only credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub name: String,
    pub has_revealed: bool,
    /// Who this participant gifts. Set once, on first reveal.
    pub assigned_to: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub participants: Vec<Participant>,
    pub budget_message: String,
    pub event_details: String,
    #[serde(with = "unix_millis")]
    pub created_at: OffsetDateTime,
}

impl Event {
    pub fn new(NewEvent { names, budget_message, event_details }: NewEvent) -> Self {
        let id = EventId::new();
        let participants = names
            .into_iter()
            .map(|name| Participant {
                id: ParticipantId::generate(),
                event_id: id,
                name,
                has_revealed: false,
                assigned_to: None,
            })
            .collect();

        // stored with millisecond precision, so drop the rest up front
        let now = OffsetDateTime::now_utc();
        let created_at = now.replace_millisecond(now.millisecond()).unwrap_or(now);

        Self {
            id,
            participants,
            budget_message,
            event_details,
            created_at,
        }
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    /// Whether someone already has to gift `id`.
    pub fn is_taken(&self, id: &ParticipantId) -> bool {
        self.participants
            .iter()
            .any(|p| p.assigned_to.as_ref() == Some(id))
    }

    /// Everyone but `requester` and anyone already drawn.
    pub fn eligible_recipients(&self, requester: &ParticipantId) -> Vec<&Participant> {
        self.participants
            .iter()
            .filter(|p| &p.id != requester && !self.is_taken(&p.id))
            .collect()
    }

    /// Eligible pool, narrowed to the last unrevealed participant when nobody gifts them yet.
    pub fn draw_pool(&self, requester: &ParticipantId) -> Vec<&Participant> {
        let pool = self.eligible_recipients(requester);

        let mut waiting = self
            .participants
            .iter()
            .filter(|p| &p.id != requester && p.assigned_to.is_none());
        if let (Some(last), None) = (waiting.next(), waiting.next()) {
            if pool.iter().any(|p| p.id == last.id) {
                return vec![last];
            }
        }
        pool
    }

    pub fn revealed_count(&self) -> usize {
        self.participants.iter().filter(|p| p.has_revealed).count()
    }
}

/// Validated input for a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub names: Vec<String>,
    pub budget_message: String,
    pub event_details: String,
}

impl NewEvent {
    /// Trims everything, drops blank names, then checks the roster and texts.
    pub fn parse<I, S>(names: I, budget_message: &str, event_details: &str) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();

        if names.len() < 2 {
            return Err(ValidationError::TooFewParticipants);
        }
        if names.len() % 2 != 0 {
            return Err(ValidationError::OddParticipantCount);
        }

        let budget_message = budget_message.trim();
        if budget_message.is_empty() {
            return Err(ValidationError::MissingBudget);
        }
        let event_details = event_details.trim();
        if event_details.is_empty() {
            return Err(ValidationError::MissingDetails);
        }

        Ok(Self {
            names,
            budget_message: budget_message.to_owned(),
            event_details: event_details.to_owned(),
        })
    }
}

mod unix_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(at: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64((at.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
        let millis = i64::deserialize(d)?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(names: &[&str]) -> Event {
        Event::new(NewEvent::parse(names.iter().copied(), "$25", "Potluck").unwrap())
    }

    #[test]
    fn fresh_participants_are_unassigned() {
        let event = event(&["Alice", "Bob", "Carol", "Dave"]);

        assert_eq!(event.participants.len(), 4);
        for p in &event.participants {
            assert!(!p.has_revealed);
            assert_eq!(p.assigned_to, None);
            assert_eq!(p.event_id, event.id);
        }
        let names: Vec<_> = event.participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn participant_ids_are_unique() {
        let event = event(&["a", "b", "c", "d", "e", "f"]);
        let mut ids: Vec<_> = event.participants.iter().map(|p| p.id.clone()).collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(ids.iter().all(|id| id.as_str().len() == 32));
    }

    #[test]
    fn pool_excludes_self_and_taken() {
        let mut event = event(&["Alice", "Bob", "Carol", "Dave"]);
        let alice = event.participants[0].id.clone();
        let bob = event.participants[1].id.clone();
        let carol = event.participants[2].id.clone();

        event.participant_mut(&alice).unwrap().assigned_to = Some(bob.clone());

        let pool: Vec<_> = event.eligible_recipients(&bob).iter().map(|p| p.name.clone()).collect();
        assert_eq!(pool, ["Alice", "Carol", "Dave"]);

        let pool: Vec<_> = event.eligible_recipients(&carol).iter().map(|p| p.name.clone()).collect();
        assert_eq!(pool, ["Alice", "Dave"]);
    }

    #[test]
    fn draw_pool_keeps_the_last_revealer_out_of_a_dead_end() {
        // Alice -> Bob -> Carol -> Alice would leave Dave with only himself
        let mut event = event(&["Alice", "Bob", "Carol", "Dave"]);
        let ids: Vec<_> = event.participants.iter().map(|p| p.id.clone()).collect();
        event.participants[0].assigned_to = Some(ids[1].clone());
        event.participants[1].assigned_to = Some(ids[2].clone());

        let pool: Vec<_> = event.eligible_recipients(&ids[2]).iter().map(|p| p.name.clone()).collect();
        assert_eq!(pool, ["Alice", "Dave"]);
        let pool: Vec<_> = event.draw_pool(&ids[2]).iter().map(|p| p.name.clone()).collect();
        assert_eq!(pool, ["Dave"]);
    }

    #[test]
    fn draw_pool_is_unrestricted_early_on() {
        let event = event(&["Alice", "Bob", "Carol", "Dave"]);
        let alice = event.participants[0].id.clone();
        assert_eq!(event.draw_pool(&alice).len(), 3);
        assert_eq!(event.draw_pool(&alice), event.eligible_recipients(&alice));
    }

    #[test]
    fn draw_pool_leaves_a_taken_last_revealer_alone() {
        // Alice -> Carol, Bob -> Dave: Carol must still pick between Alice and Bob
        let mut event = event(&["Alice", "Bob", "Carol", "Dave"]);
        let ids: Vec<_> = event.participants.iter().map(|p| p.id.clone()).collect();
        event.participants[0].assigned_to = Some(ids[2].clone());
        event.participants[1].assigned_to = Some(ids[3].clone());

        let pool: Vec<_> = event.draw_pool(&ids[2]).iter().map(|p| p.name.clone()).collect();
        assert_eq!(pool, ["Alice", "Bob"]);
    }

    #[test]
    fn parse_trims_and_drops_blank_names() {
        let parsed = NewEvent::parse(["  Alice ", "", "Bob", "   "], " $25 ", "\tPotluck\n").unwrap();
        assert_eq!(parsed.names, ["Alice", "Bob"]);
        assert_eq!(parsed.budget_message, "$25");
        assert_eq!(parsed.event_details, "Potluck");
    }

    #[test]
    fn parse_rejects_bad_rosters() {
        assert_eq!(
            NewEvent::parse(["Alice"], "$25", "Potluck"),
            Err(ValidationError::TooFewParticipants)
        );
        assert_eq!(
            NewEvent::parse(["Alice", "Bob", "Carol"], "$25", "Potluck"),
            Err(ValidationError::OddParticipantCount)
        );
        assert_eq!(
            NewEvent::parse(["Alice", "Bob"], "  ", "Potluck"),
            Err(ValidationError::MissingBudget)
        );
        assert_eq!(
            NewEvent::parse(["Alice", "Bob"], "$25", ""),
            Err(ValidationError::MissingDetails)
        );
    }

    #[test]
    fn created_at_survives_json() {
        let event = event(&["Alice", "Bob"]);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"createdAt\":"));
        assert!(json.contains("\"hasRevealed\":false"));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
