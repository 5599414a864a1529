//! Time-indexed storage for pending and completed events.
//!
//! Each event kind has its own [`EventQueue`], a multi-map from time step to the events
//! scheduled at that step. Events scheduled for the same step keep their insertion order, so
//! draining a step is deterministic. Draining a step removes its events; once a step has been
//! drained for a kind, scheduling another event of that kind at or before it is a logic error
//! since the event would never run.

use std::collections::BTreeMap;

use log::trace;

use crate::error::SimError;
use crate::event::{
    AlertEvent, ContactEvent, Event, EventList, InfectionEvent, PolicyEvent,
    ProcessedEventResult, Time, VirusEvent,
};

/// Events of one kind, grouped by time.
#[derive(Debug, Clone)]
pub struct EventQueue<T> {
    events: BTreeMap<Time, Vec<T>>,
    len: usize,
    drained_through: Option<Time>,
}

impl<T: StoredEvent> EventQueue<T> {
    #[must_use]
    pub fn new() -> EventQueue<T> {
        EventQueue {
            events: BTreeMap::new(),
            len: 0,
            drained_through: None,
        }
    }

    /// Adds an event at its own time.
    ///
    /// # Errors
    ///
    /// Returns an error if the event's time step has already been drained.
    pub fn add(&mut self, event: T) -> Result<(), SimError> {
        let time = event.time();
        if self.drained_through.is_some_and(|drained| time <= drained) {
            return Err(SimError::SimError(format!(
                "cannot schedule {:?} event at time {time}: time has already been processed",
                Into::<Event>::into(event).kind()
            )));
        }
        self.insert(event);
        Ok(())
    }

    fn insert(&mut self, event: T) {
        self.events.entry(event.time()).or_default().push(event);
        self.len += 1;
    }

    /// Removes and returns every event scheduled for exactly `time`.
    pub fn take_due(&mut self, time: Time) -> Vec<T> {
        self.drained_through = Some(self.drained_through.map_or(time, |d| d.max(time)));
        let due = self.events.remove(&time).unwrap_or_default();
        self.len -= due.len();
        due
    }

    /// The latest time at which an event is held.
    #[must_use]
    pub fn last_time(&self) -> Option<Time> {
        self.events.last_key_value().map(|(time, _)| *time)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the events with `from <= time <= to`, in time order.
    pub fn range(&self, from: Time, to: Time) -> impl Iterator<Item = &T> {
        let bounds = if from <= to { from..=to } else { to..=from };
        self.events.range(bounds).flat_map(|(_, events)| events)
    }
}

impl<T: StoredEvent> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One queue per event kind.
#[derive(Debug, Clone, Default)]
pub struct EventQueues {
    contact: EventQueue<ContactEvent>,
    infection: EventQueue<InfectionEvent>,
    virus: EventQueue<VirusEvent>,
    alert: EventQueue<AlertEvent>,
    policy: EventQueue<PolicyEvent>,
}

impl EventQueues {
    fn add_all(&mut self, events: EventList) -> Result<(), SimError> {
        let EventList {
            contact,
            infection,
            virus,
            alert,
            policy,
        } = events;
        contact.into_iter().try_for_each(|e| self.contact.add(e))?;
        infection.into_iter().try_for_each(|e| self.infection.add(e))?;
        virus.into_iter().try_for_each(|e| self.virus.add(e))?;
        alert.into_iter().try_for_each(|e| self.alert.add(e))?;
        policy.into_iter().try_for_each(|e| self.policy.add(e))?;
        Ok(())
    }

    /// Records events without the drained-time check; completed queues are never drained.
    fn insert_all(&mut self, events: EventList) {
        let EventList {
            contact,
            infection,
            virus,
            alert,
            policy,
        } = events;
        contact.into_iter().for_each(|e| self.contact.insert(e));
        infection.into_iter().for_each(|e| self.infection.insert(e));
        virus.into_iter().for_each(|e| self.virus.insert(e));
        alert.into_iter().for_each(|e| self.alert.insert(e));
        policy.into_iter().for_each(|e| self.policy.insert(e));
    }
}

/// An event kind that the [`EventStore`] keeps a queue for.
pub trait StoredEvent: Copy + Into<Event> {
    fn time(&self) -> Time;

    #[doc(hidden)]
    fn queue(queues: &EventQueues) -> &EventQueue<Self>;

    #[doc(hidden)]
    fn queue_mut(queues: &mut EventQueues) -> &mut EventQueue<Self>;
}

macro_rules! impl_stored_event {
    ($($event:ty => $field:ident),* $(,)?) => {
        $(
            impl StoredEvent for $event {
                fn time(&self) -> Time {
                    self.time
                }

                fn queue(queues: &EventQueues) -> &EventQueue<Self> {
                    &queues.$field
                }

                fn queue_mut(queues: &mut EventQueues) -> &mut EventQueue<Self> {
                    &mut queues.$field
                }
            }
        )*
    };
}

impl_stored_event!(
    ContactEvent => contact,
    InfectionEvent => infection,
    VirusEvent => virus,
    AlertEvent => alert,
    PolicyEvent => policy,
);

/// Pending events per kind, plus a parallel store of completed events kept for tracing and
/// output.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    pending: EventQueues,
    completed: EventQueues,
}

impl EventStore {
    #[must_use]
    pub fn new() -> EventStore {
        EventStore::default()
    }

    /// Schedules every event in `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if an event is scheduled at a time already drained for its kind.
    pub fn add(&mut self, events: EventList) -> Result<(), SimError> {
        trace!("adding {} events", events.len());
        self.pending.add_all(events)
    }

    /// Schedules a single event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event's time has already been drained for its kind.
    pub fn add_event<T: StoredEvent>(&mut self, event: T) -> Result<(), SimError> {
        T::queue_mut(&mut self.pending).add(event)
    }

    /// Removes and returns the events of kind `T` due at exactly `time`.
    pub fn take_due<T: StoredEvent>(&mut self, time: Time) -> Vec<T> {
        T::queue_mut(&mut self.pending).take_due(time)
    }

    /// Moves consumed events into the completed store.
    pub fn complete(&mut self, events: EventList) {
        self.completed.insert_all(events);
    }

    /// Schedules the new events of `result` and records its completed events.
    ///
    /// # Errors
    ///
    /// Returns an error if a new event is scheduled at a time already drained for its kind.
    pub fn commit(&mut self, result: ProcessedEventResult) -> Result<(), SimError> {
        let ProcessedEventResult {
            new_events,
            completed_events,
        } = result;
        self.add(new_events)?;
        self.complete(completed_events);
        Ok(())
    }

    /// The latest time at which an event of kind `T` is pending.
    #[must_use]
    pub fn last_time<T: StoredEvent>(&self) -> Option<Time> {
        T::queue(&self.pending).last_time()
    }

    #[must_use]
    pub fn pending<T: StoredEvent>(&self) -> &EventQueue<T> {
        T::queue(&self.pending)
    }

    #[must_use]
    pub fn completed<T: StoredEvent>(&self) -> &EventQueue<T> {
        T::queue(&self.completed)
    }
}
