//! The per-step orchestrator.
//!
//! Each time step runs the stages in a fixed order: seed infections (first step only), alerts,
//! contacts, infections, virus progressions, policy events, then random infections. Later
//! stages see the state changes of earlier ones, and the sampler is consumed in this order, so
//! the order is part of what makes a seeded run reproducible. The new and completed events of
//! every stage are merged and committed to the event store when the step ends.

use log::{debug, info};
use serde::Serialize;

use crate::case::{CaseId, ExposedBy};
use crate::context::Context;
use crate::error::SimError;
use crate::event::{ContactEvent, EventList, InfectionEvent, ProcessedEventResult, Time};
use crate::processor::{
    process_due, AlertEventProcessor, ContactEventProcessor, InfectionEventProcessor,
    PolicyEventProcessor, VirusEventProcessor,
};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// The last step processed, or `None` if the horizon was zero.
    pub last_time: Option<Time>,
    pub steps: i64,
    /// Whether the run reached a steady state before the horizon.
    pub stopped_early: bool,
}

pub struct EventRunner {
    initial_cases: Vec<CaseId>,
    random_infection_rate: f64,
    last_contact_time: Option<Time>,
}

impl EventRunner {
    /// A runner that seeds `initial_cases` at time 0. The random infection rate starts at the
    /// configured rate of the context it runs.
    #[must_use]
    pub fn new(initial_cases: Vec<CaseId>) -> EventRunner {
        EventRunner {
            initial_cases,
            random_infection_rate: 0.0,
            last_contact_time: None,
        }
    }

    /// The current per-day random infection rate; forced to zero once the contact stream has
    /// ended with no active cases.
    #[must_use]
    pub fn random_infection_rate(&self) -> f64 {
        self.random_infection_rate
    }

    /// Runs steps from 0 up to the time limit, or until a steady state when enabled.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: an unknown seed case, an invalid transition, an
    /// unreachable dwell-time lookup or an ambiguous isolation rule set.
    pub fn run(&mut self, context: &mut Context) -> Result<RunSummary, SimError> {
        for id in &self.initial_cases {
            if !context.population().contains(*id) {
                return Err(SimError::InvalidConfiguration(format!(
                    "initial case {id} is not in the population"
                )));
            }
        }
        self.random_infection_rate = context.disease().random_infection_rate;
        self.last_contact_time = context.event_store().last_time::<ContactEvent>();

        let horizon = context.standard().horizon();
        info!(
            "running {} cases for {horizon} steps with {} initial cases",
            context.population().len(),
            self.initial_cases.len()
        );

        let mut summary = RunSummary {
            last_time: None,
            steps: 0,
            stopped_early: false,
        };
        for time in 0..horizon {
            self.step(context, time)?;
            summary.last_time = Some(time);
            summary.steps += 1;

            if context.standard().steady_state && self.steady_state_reached(context, time) {
                info!("steady state reached at {time}");
                summary.stopped_early = time + 1 < horizon;
                break;
            }
        }
        Ok(summary)
    }

    /// Processes a single time step and commits its results.
    ///
    /// # Errors
    ///
    /// Propagates the first processor error.
    pub fn step(&mut self, context: &mut Context, time: Time) -> Result<(), SimError> {
        context.begin_step(time);

        if time == 0 {
            let mut seeds = EventList::default();
            for id in &self.initial_cases {
                seeds.push(InfectionEvent::exposure(0, *id, ExposedBy::Initial, 0));
            }
            context.event_store_mut().add(seeds)?;
        }

        let mut result = process_due(&AlertEventProcessor, context, time)?;
        result.merge(process_due(&ContactEventProcessor, context, time)?);
        result.merge(process_due(&InfectionEventProcessor, context, time)?);
        result.merge(process_due(&VirusEventProcessor, context, time)?);
        result.merge(process_due(&PolicyEventProcessor, context, time)?);
        result.merge(self.random_infections(context, time));

        context.event_store_mut().commit(result)?;

        let steps_per_day = context.standard().steps_per_day;
        let day = time / steps_per_day;
        let counts = context.population().counts(time);
        context.statistics_mut().record_day(day, counts);
        if (time + 1) % steps_per_day == 0 {
            info!(
                "day {day}: S={} E={} A={} P={} Sym={} Sev={} R={} D={}",
                counts.s, counts.e, counts.a, counts.p, counts.sym, counts.sev, counts.r, counts.d
            );
        }
        Ok(())
    }

    /// One Bernoulli trial per susceptible case, in id order, while the contact stream lasts.
    fn random_infections(&self, context: &mut Context, time: Time) -> ProcessedEventResult {
        let mut result = ProcessedEventResult::default();
        let contacts_ongoing = self.last_contact_time.is_some_and(|last| time < last);
        if self.random_infection_rate <= 0.0 || !contacts_ongoing {
            return result;
        }

        #[allow(clippy::cast_precision_loss)]
        let probability = self.random_infection_rate / context.standard().steps_per_day as f64;
        for id in context.population().susceptible_ids() {
            if context.uniform() < probability {
                debug!("random infection of case {id} at {time}");
                result.add_new(InfectionEvent::exposure(
                    time + 1,
                    id,
                    ExposedBy::Random,
                    time,
                ));
            }
        }
        result
    }

    /// Whether nothing can change any more: no active cases, no random infections and no
    /// exposures waiting to happen.
    fn steady_state_reached(&mut self, context: &Context, time: Time) -> bool {
        if context.population().active_cases() > 0 {
            return false;
        }
        let contacts_over = self.last_contact_time.is_none_or(|last| time >= last);
        if contacts_over {
            self.random_infection_rate = 0.0;
        }
        self.random_infection_rate == 0.0
            && context
                .event_store()
                .pending::<InfectionEvent>()
                .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{context, properties};
    use crate::population::testing::uniform_population;
    use crate::random::testing::ScriptedSampler;
    use crate::random::RandomSampler;
    use crate::event::AlertEvent;
    use crate::isolation::testing::rule;
    use crate::isolation::VirusStatusIsolationPolicy;
    use crate::properties::ContactTracingProperties;
    use crate::status::{AlertStatus, VirusStatus};

    fn contact(time: Time, from: u32, to: u32) -> ContactEvent {
        ContactEvent {
            time,
            from: CaseId(from),
            to: CaseId(to),
            weight: 1.0,
        }
    }

    #[test]
    fn seeds_are_exposed_at_time_zero() {
        let mut context = context(3, ScriptedSampler::fixed(2, 0.0));
        let mut runner = EventRunner::new(vec![CaseId(0), CaseId(2)]);
        runner.step(&mut context, 0).unwrap();

        let population = context.population();
        assert_eq!(population.virus_status(CaseId(0)).unwrap(), VirusStatus::Exposed);
        assert_eq!(population.virus_status(CaseId(1)).unwrap(), VirusStatus::Susceptible);
        assert_eq!(
            population.get(CaseId(2)).unwrap().exposed_by(),
            Some(ExposedBy::Initial)
        );
        assert_eq!(context.statistics().day(0).unwrap().e, 2);
        assert_eq!(context.event_store().completed::<InfectionEvent>().len(), 2);
    }

    #[test]
    fn unknown_seed_case() {
        let mut context = context(3, ScriptedSampler::default());
        let mut runner = EventRunner::new(vec![CaseId(3)]);
        assert!(matches!(
            runner.run(&mut context),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn single_case_runs_its_course() {
        // health 0.5 and every uniform 0.0: asymptomatic, then recovered, 2 days each
        let mut context = context(1, ScriptedSampler::fixed(2, 0.0));
        let mut runner = EventRunner::new(vec![CaseId(0)]);
        let summary = runner.run(&mut context).unwrap();

        assert_eq!(
            context.population().virus_status(CaseId(0)).unwrap(),
            VirusStatus::Recovered
        );
        // exposed at 0, asymptomatic at 2, recovered at 4
        assert_eq!(summary.last_time, Some(4));
        assert!(summary.stopped_early);
        assert_eq!(context.statistics().day(2).unwrap().a, 1);
        assert_eq!(context.statistics().daily_records().count(), 5);
    }

    #[test]
    fn runs_to_the_horizon_without_steady_state() {
        let mut properties = properties(1);
        properties.standard.steady_state = false;
        properties.standard.time_limit_days = 6;
        properties.standard.steps_per_day = 2;
        let mut context = Context::new(
            properties,
            uniform_population(1, 0.5),
            Box::new(ScriptedSampler::fixed(1, 0.0)),
        )
        .unwrap();
        let summary = EventRunner::new(vec![]).run(&mut context).unwrap();
        assert_eq!(summary.steps, 12);
        assert_eq!(summary.last_time, Some(11));
        assert!(!summary.stopped_early);
        // one record per day, taken at the last step of the day
        assert_eq!(context.statistics().daily_records().count(), 6);
        assert_eq!(context.statistics().day(5).unwrap().time, 11);
    }

    #[test]
    fn symptomatic_case_goes_through_testing() {
        // uniforms 0.9: presymptomatic course, then severe; every delay is one step
        let mut context = context(1, ScriptedSampler::fixed(1, 0.9));
        let mut runner = EventRunner::new(vec![CaseId(0)]);
        for time in 0..=2 {
            runner.step(&mut context, time).unwrap();
        }
        // exposed 0, presymptomatic 1, symptomatic 2
        assert_eq!(
            context.population().virus_status(CaseId(0)).unwrap(),
            VirusStatus::Symptomatic
        );
        assert_eq!(context.event_store().pending::<AlertEvent>().len(), 1);

        runner.step(&mut context, 3).unwrap();
        assert_eq!(
            context.population().alert_status(CaseId(0)).unwrap(),
            AlertStatus::RequestedTest
        );
        assert_eq!(
            context.population().virus_status(CaseId(0)).unwrap(),
            VirusStatus::SeverelySymptomatic
        );

        // The result is decided at 4, before the virus stage of that step kills the case.
        for time in 4..=5 {
            runner.step(&mut context, time).unwrap();
        }
        assert_eq!(
            context.population().virus_status(CaseId(0)).unwrap(),
            VirusStatus::Dead
        );
        assert_eq!(
            context.population().alert_status(CaseId(0)).unwrap(),
            AlertStatus::TestedPositive
        );
    }

    #[test]
    fn suppressed_contacts_are_still_traced() {
        let mut properties = properties(2);
        properties.contact_tracing = Some(ContactTracingProperties {
            window_days: 7,
            min_weight: 0.0,
        });
        properties
            .isolation
            .virus_status_policies
            .push(VirusStatusIsolationPolicy {
                virus_status: VirusStatus::Symptomatic,
                isolation_property: rule("symptomatic", 100, None, 1),
            });
        // Case 0 (symptomatic rule): threshold 0, probability 100. Case 1 (default rule):
        // threshold and probability 0. A uniform of 0 would expose case 1 if the contact went
        // through.
        let sampler = ScriptedSampler::fixed(0, 0.0).with_values(&[0, 100]);
        let mut context =
            Context::new(properties, uniform_population(2, 0.5), Box::new(sampler)).unwrap();
        context.population_mut().force_status(
            CaseId(0),
            VirusStatus::Symptomatic,
            AlertStatus::AwaitingResult,
        );
        context.add_contacts(vec![contact(1, 0, 1)]).unwrap();
        context
            .event_store_mut()
            .add_event(AlertEvent {
                time: 2,
                id: CaseId(0),
                old_status: AlertStatus::AwaitingResult,
                next_status: AlertStatus::TestedPositive,
            })
            .unwrap();

        let mut runner = EventRunner::new(vec![]);
        for time in 0..=1 {
            runner.step(&mut context, time).unwrap();
        }
        assert!(context.statistics().infections().is_empty());
        assert!(context.event_store().pending::<InfectionEvent>().is_empty());
        assert_eq!(context.event_store().completed::<ContactEvent>().len(), 1);

        runner.step(&mut context, 2).unwrap();
        let alerts: Vec<AlertEvent> = context
            .event_store()
            .pending::<AlertEvent>()
            .range(3, 3)
            .copied()
            .filter(|alert| alert.id == CaseId(1))
            .collect();
        assert_eq!(
            alerts,
            vec![AlertEvent {
                time: 3,
                id: CaseId(1),
                old_status: AlertStatus::None,
                next_status: AlertStatus::Alerted,
            }]
        );

        runner.step(&mut context, 3).unwrap();
        assert_eq!(
            context.population().alert_status(CaseId(1)).unwrap(),
            AlertStatus::Alerted
        );
        assert_eq!(
            context.population().virus_status(CaseId(1)).unwrap(),
            VirusStatus::Susceptible
        );
    }

    #[test]
    fn contacts_spread_the_infection() {
        let mut properties = properties(2);
        properties.disease.exposure_probability_4_unit_contact = 0.999;
        let mut context = Context::new(
            properties,
            uniform_population(2, 0.5),
            Box::new(ScriptedSampler::fixed(1, 0.0)),
        )
        .unwrap();
        context
            .add_contacts((0..10).map(|time| contact(time, 0, 1)).collect())
            .unwrap();

        let mut runner = EventRunner::new(vec![CaseId(0)]);
        let summary = runner.run(&mut context).unwrap();

        // 0 is infectious from 1 to 2 and meets 1 at 2; 1 is infected at 3 and recovers at 5.
        let infectee = context.population().get(CaseId(1)).unwrap();
        assert_eq!(infectee.exposed_by(), Some(ExposedBy::Case(CaseId(0))));
        assert_eq!(infectee.exposed_time(), Some(2));
        assert_eq!(context.statistics().infections().len(), 2);
        // Nobody left to infect, so the remaining contacts are never processed.
        assert_eq!(summary.last_time, Some(5));
        assert_eq!(context.event_store().pending::<ContactEvent>().len(), 4);
    }

    #[test]
    fn random_infections_stop_with_the_contact_stream() {
        let mut properties = properties(4);
        properties.disease.random_infection_rate = 1.0;
        let mut context = Context::new(
            properties,
            uniform_population(4, 0.5),
            Box::new(RandomSampler::new(11)),
        )
        .unwrap();
        context.add_contacts(vec![contact(3, 2, 3)]).unwrap();

        let mut runner = EventRunner::new(vec![]);
        let summary = runner.run(&mut context).unwrap();
        // A rate of one per day infects everyone on the first step.
        assert!(context
            .statistics()
            .infections()
            .iter()
            .all(|record| record.infector == ExposedBy::Random && record.time == 1));
        assert_eq!(context.statistics().infections().len(), 4);
        assert_eq!(runner.random_infection_rate(), 0.0);
        assert!(summary.stopped_early);
    }
}
