use log::trace;

use crate::context::Context;
use crate::error::SimError;
use crate::event::{AlertEvent, ProcessedEventResult, VirusEvent};
use crate::processor::{next_virus_status, EventProcessor};
use crate::status::{AlertStatus, VirusStatus};

/// Applies a due disease progression and schedules the one after it.
///
/// Draws, in order: the branch uniform (branching compartments only), the dwell time, and on
/// arrival in `Symptomatic` the uniform deciding whether the case reports itself for a test.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirusEventProcessor;

impl EventProcessor for VirusEventProcessor {
    type Event = VirusEvent;

    fn process(
        &self,
        context: &mut Context,
        event: &VirusEvent,
    ) -> Result<ProcessedEventResult, SimError> {
        let mut result = ProcessedEventResult::completed(*event);
        let id = event.id;

        context
            .population_mut()
            .set_virus_status(id, event.next_status)?;
        let status = event.next_status;
        trace!("case {id} is {status:?} at {}", event.time);

        let next = next_virus_status(context, id, status)?;
        if next != status {
            let distribution = context.disease().progression_time(status, next)?;
            let dwell = context.sample_steps(&distribution);
            result.add_new(VirusEvent {
                time: event.time + dwell,
                id,
                old_status: status,
                next_status: next,
            });
        }

        if status == VirusStatus::Symptomatic {
            let reporting_compliance = context.population().get(id)?.reporting_compliance;
            if context.uniform() < reporting_compliance {
                result.add_new(AlertEvent {
                    time: event.time + 1,
                    id,
                    old_status: AlertStatus::None,
                    next_status: AlertStatus::RequestedTest,
                });
            }
        }
        Ok(result)
    }
}
