//! Event processors turn one due event into zero or more follow-on events.
//!
//! There is one processor per event kind. Each reads and mutates case state through the
//! [`Context`] and returns a [`ProcessedEventResult`]; scheduling the new events is left to the
//! [`EventRunner`](crate::event_runner::EventRunner), which commits the merged results of a step
//! at its end. Every processor marks its input event completed, including events it drops as
//! stale.

mod alert;
mod contact;
mod infection;
mod virus;

use crate::case::CaseId;
use crate::context::Context;
use crate::error::SimError;
use crate::event::{PolicyEvent, ProcessedEventResult, StoredEvent, Time};
use crate::status::VirusStatus;

pub use alert::AlertEventProcessor;
pub use contact::{exposure_probability, ContactEventProcessor};
pub use infection::InfectionEventProcessor;
pub use virus::VirusEventProcessor;

pub trait EventProcessor {
    type Event: StoredEvent;

    /// Applies `event` to the simulation state.
    ///
    /// # Errors
    ///
    /// Returns an error only for logic defects or misconfiguration: an invalid transition, an
    /// unreachable dwell-time lookup or an ambiguous isolation rule set. Stale events are not
    /// errors.
    fn process(
        &self,
        context: &mut Context,
        event: &Self::Event,
    ) -> Result<ProcessedEventResult, SimError>;
}

/// Drains every event of the processor's kind due at `time` and processes them in insertion
/// order.
///
/// # Errors
///
/// Propagates the first processor error.
pub fn process_due<P: EventProcessor>(
    processor: &P,
    context: &mut Context,
    time: Time,
) -> Result<ProcessedEventResult, SimError> {
    let due = context.event_store_mut().take_due::<P::Event>(time);
    let mut result = ProcessedEventResult::default();
    for event in &due {
        result.merge(processor.process(context, event)?);
    }
    Ok(result)
}

/// Consumes policy events without effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEventProcessor;

impl EventProcessor for PolicyEventProcessor {
    type Event = PolicyEvent;

    fn process(
        &self,
        _context: &mut Context,
        event: &PolicyEvent,
    ) -> Result<ProcessedEventResult, SimError> {
        Ok(ProcessedEventResult::completed(*event))
    }
}

/// Picks the compartment a case moves to after `status`.
///
/// Compartments with two successors draw a uniform and take the milder one iff the draw is
/// below the case's health. Terminal compartments return themselves.
pub(crate) fn next_virus_status(
    context: &mut Context,
    id: CaseId,
    status: VirusStatus,
) -> Result<VirusStatus, SimError> {
    let (milder, worse) = match status {
        VirusStatus::Exposed => (VirusStatus::Asymptomatic, VirusStatus::Presymptomatic),
        VirusStatus::Symptomatic => (VirusStatus::Recovered, VirusStatus::SeverelySymptomatic),
        VirusStatus::SeverelySymptomatic => (VirusStatus::Recovered, VirusStatus::Dead),
        _ => {
            return Ok(status.valid_transitions().first().copied().unwrap_or(status));
        }
    };
    let health = context.population().health(id)?;
    if context.uniform() < health {
        Ok(milder)
    } else {
        Ok(worse)
    }
}
