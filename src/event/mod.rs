//! The typed event model.
//!
//! Every event kind is a plain immutable struct; [`Event`] is the closed union over them and
//! is what the processors hand back to the orchestrator. Events are created by processors (or
//! by the input layer for contacts), stored in the [`EventStore`] until their time step, and
//! consumed exactly once.

mod store;

use serde::{Deserialize, Serialize};

use crate::case::{CaseId, ExposedBy};
use crate::status::{AlertStatus, VirusStatus};

pub use store::{EventQueue, EventStore, StoredEvent};

/// A simulation time step.
pub type Time = i64;

/// A recorded interaction between two cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub time: Time,
    pub from: CaseId,
    pub to: CaseId,
    pub weight: f64,
}

impl ContactEvent {
    /// The other party of the contact, if `id` took part in it.
    #[must_use]
    pub fn counterpart(&self, id: CaseId) -> Option<CaseId> {
        if self.from == id {
            Some(self.to)
        } else if self.to == id {
            Some(self.from)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionEvent {
    pub time: Time,
    pub id: CaseId,
    pub old_status: VirusStatus,
    pub next_status: VirusStatus,
    pub exposed_by: ExposedBy,
    pub exposed_time: Time,
}

impl InfectionEvent {
    /// An exposure of a susceptible case.
    #[must_use]
    pub fn exposure(time: Time, id: CaseId, exposed_by: ExposedBy, exposed_time: Time) -> Self {
        InfectionEvent {
            time,
            id,
            old_status: VirusStatus::Susceptible,
            next_status: VirusStatus::Exposed,
            exposed_by,
            exposed_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirusEvent {
    pub time: Time,
    pub id: CaseId,
    pub old_status: VirusStatus,
    pub next_status: VirusStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub time: Time,
    pub id: CaseId,
    pub old_status: AlertStatus,
    pub next_status: AlertStatus,
}

/// Reserved for policy changes scheduled during a run; carries no payload yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEvent {
    pub time: Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Contact,
    Infection,
    Virus,
    Alert,
    Policy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Contact(ContactEvent),
    Infection(InfectionEvent),
    Virus(VirusEvent),
    Alert(AlertEvent),
    Policy(PolicyEvent),
}

impl Event {
    #[must_use]
    pub fn time(&self) -> Time {
        match self {
            Event::Contact(e) => e.time,
            Event::Infection(e) => e.time,
            Event::Virus(e) => e.time,
            Event::Alert(e) => e.time,
            Event::Policy(e) => e.time,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Contact(_) => EventKind::Contact,
            Event::Infection(_) => EventKind::Infection,
            Event::Virus(_) => EventKind::Virus,
            Event::Alert(_) => EventKind::Alert,
            Event::Policy(_) => EventKind::Policy,
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident($event:ty)),* $(,)?) => {
        $(
            impl From<$event> for Event {
                fn from(event: $event) -> Self {
                    Event::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    Contact(ContactEvent),
    Infection(InfectionEvent),
    Virus(VirusEvent),
    Alert(AlertEvent),
    Policy(PolicyEvent),
);

/// Events grouped by kind, in insertion order within each kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventList {
    pub contact: Vec<ContactEvent>,
    pub infection: Vec<InfectionEvent>,
    pub virus: Vec<VirusEvent>,
    pub alert: Vec<AlertEvent>,
    pub policy: Vec<PolicyEvent>,
}

impl EventList {
    pub fn push(&mut self, event: impl Into<Event>) {
        match event.into() {
            Event::Contact(e) => self.contact.push(e),
            Event::Infection(e) => self.infection.push(e),
            Event::Virus(e) => self.virus.push(e),
            Event::Alert(e) => self.alert.push(e),
            Event::Policy(e) => self.policy.push(e),
        }
    }

    /// Moves every event of `other` to the end of the matching list of `self`.
    pub fn append(&mut self, other: &mut EventList) {
        self.contact.append(&mut other.contact);
        self.infection.append(&mut other.infection);
        self.virus.append(&mut other.virus);
        self.alert.append(&mut other.alert);
        self.policy.append(&mut other.policy);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contact.len()
            + self.infection.len()
            + self.virus.len()
            + self.alert.len()
            + self.policy.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The outcome of processing one event: what it scheduled and what it consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedEventResult {
    pub new_events: EventList,
    pub completed_events: EventList,
}

impl ProcessedEventResult {
    /// A result that only marks `event` as consumed.
    #[must_use]
    pub fn completed(event: impl Into<Event>) -> ProcessedEventResult {
        let mut result = ProcessedEventResult::default();
        result.completed_events.push(event);
        result
    }

    pub fn add_new(&mut self, event: impl Into<Event>) {
        self.new_events.push(event);
    }

    pub fn merge(&mut self, mut other: ProcessedEventResult) {
        self.new_events.append(&mut other.new_events);
        self.completed_events.append(&mut other.completed_events);
    }
}
