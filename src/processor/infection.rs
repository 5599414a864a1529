use log::{debug, trace};

use crate::context::Context;
use crate::error::SimError;
use crate::event::{InfectionEvent, ProcessedEventResult, VirusEvent};
use crate::processor::{next_virus_status, EventProcessor};
use crate::status::VirusStatus;

/// Moves a susceptible case into the exposed compartment and schedules the end of its latent
/// period. Exposures of cases that are no longer susceptible are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfectionEventProcessor;

impl EventProcessor for InfectionEventProcessor {
    type Event = InfectionEvent;

    fn process(
        &self,
        context: &mut Context,
        event: &InfectionEvent,
    ) -> Result<ProcessedEventResult, SimError> {
        let mut result = ProcessedEventResult::completed(*event);
        let id = event.id;

        let status = context.population().virus_status(id)?;
        if status != event.old_status {
            debug!(
                "dropping exposure of case {id} at {}: already {status:?}",
                event.time
            );
            return Ok(result);
        }

        let population = context.population_mut();
        population.set_virus_status(id, event.next_status)?;
        population.set_exposure(id, event.exposed_by, event.exposed_time)?;
        context
            .statistics_mut()
            .record_infection(event.time, event.exposed_by, id);

        let next = next_virus_status(context, id, VirusStatus::Exposed)?;
        let distribution = context
            .disease()
            .progression_time(VirusStatus::Exposed, next)?;
        let dwell = context.sample_steps(&distribution);
        trace!(
            "case {id} exposed by {} at {}; {next:?} at {}",
            event.exposed_by,
            event.time,
            event.time + dwell
        );
        result.add_new(VirusEvent {
            time: event.time + dwell,
            id,
            old_status: VirusStatus::Exposed,
            next_status: next,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseId, ExposedBy};
    use crate::context::testing::context;
    use crate::random::testing::ScriptedSampler;
    use crate::status::AlertStatus;

    #[test]
    fn exposure_schedules_end_of_latency() {
        // health 0.5: a 0.2 draw picks the asymptomatic course
        let sampler = ScriptedSampler::fixed(0, 0.0)
            .with_uniforms(&[0.2])
            .with_values(&[4]);
        let mut context = context(2, sampler);
        let event = InfectionEvent::exposure(3, CaseId(1), ExposedBy::Case(CaseId(0)), 2);

        let result = InfectionEventProcessor.process(&mut context, &event).unwrap();
        let case = context.population().get(CaseId(1)).unwrap();
        assert_eq!(case.virus_status(), VirusStatus::Exposed);
        assert_eq!(case.exposed_by(), Some(ExposedBy::Case(CaseId(0))));
        assert_eq!(case.exposed_time(), Some(2));
        assert_eq!(
            result.new_events.virus,
            vec![VirusEvent {
                time: 7,
                id: CaseId(1),
                old_status: VirusStatus::Exposed,
                next_status: VirusStatus::Asymptomatic,
            }]
        );
        assert_eq!(result.completed_events.infection, vec![event]);
        assert_eq!(context.statistics().infections().len(), 1);
    }

    #[test]
    fn clashing_exposure_is_a_no_op() {
        let mut context = context(1, ScriptedSampler::fixed(2, 0.0));
        context
            .population_mut()
            .force_status(CaseId(0), VirusStatus::Presymptomatic, AlertStatus::None);
        let event = InfectionEvent::exposure(3, CaseId(0), ExposedBy::Random, 2);

        for _ in 0..2 {
            let result = InfectionEventProcessor.process(&mut context, &event).unwrap();
            assert!(result.new_events.is_empty());
            assert_eq!(result.completed_events.infection, vec![event]);
            assert_eq!(
                context.population().virus_status(CaseId(0)).unwrap(),
                VirusStatus::Presymptomatic
            );
        }
        assert!(context.statistics().infections().is_empty());
    }

    #[test]
    fn unknown_case_is_an_error() {
        let mut context = context(1, ScriptedSampler::default());
        let event = InfectionEvent::exposure(0, CaseId(9), ExposedBy::Initial, 0);
        assert!(matches!(
            InfectionEventProcessor.process(&mut context, &event),
            Err(SimError::UnknownCase(CaseId(9)))
        ));
    }
}
