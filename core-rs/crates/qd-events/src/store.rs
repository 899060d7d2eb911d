//! Agent event store: an append-only, capacity-capped log of
//! human-in-the-loop approval events with fault-isolated subscribers.
//!
//! Grounded on the reference db crate's append-then-trim persistence
//! idiom (trailing in-memory window over an authoritative log),
//! generalized from unbounded audit events to a fixed 500-event
//! retention window with single-writer eviction.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

pub const CAPACITY: usize = 500;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
    /// Terminal status for a system-generated event recording that a
    /// decision was made on some other event (see `approve`/`reject`).
    Completed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentEvent {
    pub id: String,
    pub event_type: String,
    pub title: String,
    pub detail: String,
    pub timestamp_ms: i64,
    pub status: EventStatus,
    pub action_params: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventStoreError {
    NotFound { id: String },
    NotPending { id: String },
}

impl std::fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "agent event '{id}' not found"),
            Self::NotPending { id } => write!(f, "agent event '{id}' is not pending"),
        }
    }
}

impl std::error::Error for EventStoreError {}

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 alphabet is ASCII")
}

fn parse_seq(id: &str) -> Option<u64> {
    let mut parts = id.splitn(3, '-');
    if parts.next()? != "evt" {
        return None;
    }
    parts.next()?.parse::<u64>().ok()
}

type Subscriber = Box<dyn Fn(&AgentEvent) + Send + Sync>;

pub struct AgentEventStore {
    events: VecDeque<AgentEvent>,
    seq: u64,
    subscribers: Vec<Subscriber>,
}

impl Default for AgentEventStore {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
            seq: 0,
            subscribers: Vec::new(),
        }
    }
}

impl AgentEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from a persisted window of events, restoring
    /// the monotone id counter from the highest observed sequence number.
    pub fn restore(events: Vec<AgentEvent>) -> Self {
        let seq = events.iter().filter_map(|e| parse_seq(&e.id)).max().unwrap_or(0);
        Self {
            events: events.into(),
            seq,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: Subscriber) {
        self.subscribers.push(callback);
    }

    /// Appends a new pending event, evicting the oldest if the store is
    /// at capacity, and notifies subscribers (faults isolated).
    pub fn add_event(
        &mut self,
        event_type: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
        timestamp_ms: i64,
        action_params: Option<Value>,
    ) -> AgentEvent {
        self.seq += 1;
        let id = format!("evt-{}-{}", self.seq, to_base36(timestamp_ms.max(0) as u64));
        let event = AgentEvent {
            id,
            event_type: event_type.into(),
            title: title.into(),
            detail: detail.into(),
            timestamp_ms,
            status: EventStatus::Pending,
            action_params,
        };

        if self.events.len() >= CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());

        for subscriber in &self.subscribers {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| subscriber(&event)));
        }

        event
    }

    /// Appends an event that is already in its terminal `Completed` state
    /// and notifies subscribers — for events that record something that
    /// already happened rather than asking for a decision.
    pub fn add_completed_event(
        &mut self,
        event_type: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
        timestamp_ms: i64,
    ) -> AgentEvent {
        self.seq += 1;
        let id = format!("evt-{}-{}", self.seq, to_base36(timestamp_ms.max(0) as u64));
        let event = AgentEvent {
            id,
            event_type: event_type.into(),
            title: title.into(),
            detail: detail.into(),
            timestamp_ms,
            status: EventStatus::Completed,
            action_params: None,
        };

        if self.events.len() >= CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());

        for subscriber in &self.subscribers {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| subscriber(&event)));
        }

        event
    }

    pub fn list_events(&self) -> impl Iterator<Item = &AgentEvent> {
        self.events.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.status == EventStatus::Pending)
            .count()
    }

    /// Marks `id` approved and appends a `Completed` system event recording
    /// the decision, leaving the original event's history intact.
    pub fn approve(&mut self, id: &str, timestamp_ms: i64) -> Result<(), EventStoreError> {
        self.decide(id, EventStatus::Approved, "approved", timestamp_ms)
    }

    /// Marks `id` rejected and appends a `Completed` system event recording
    /// the decision, leaving the original event's history intact.
    pub fn reject(&mut self, id: &str, timestamp_ms: i64) -> Result<(), EventStoreError> {
        self.decide(id, EventStatus::Rejected, "rejected", timestamp_ms)
    }

    fn decide(
        &mut self,
        id: &str,
        status: EventStatus,
        verb: &str,
        timestamp_ms: i64,
    ) -> Result<(), EventStoreError> {
        let title = {
            let event = self
                .events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| EventStoreError::NotFound { id: id.to_string() })?;
            if event.status != EventStatus::Pending {
                return Err(EventStoreError::NotPending { id: id.to_string() });
            }
            event.status = status;
            event.title.clone()
        };

        self.seq += 1;
        let decision_id = format!("evt-{}-{}", self.seq, to_base36(timestamp_ms.max(0) as u64));
        let decision_event = AgentEvent {
            id: decision_id,
            event_type: "decision".to_string(),
            title: format!("{title} {verb}"),
            detail: format!("event '{id}' was {verb}"),
            timestamp_ms,
            status: EventStatus::Completed,
            action_params: None,
        };
        if self.events.len() >= CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(decision_event.clone());
        for subscriber in &self.subscribers {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| subscriber(&decision_event)));
        }

        Ok(())
    }
}
