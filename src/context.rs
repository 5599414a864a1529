//! All mutable state of one simulation run.
//!
//! A `Context` owns the population, the event store, the isolation engine, the statistics sink
//! and the single sampler every stochastic draw goes through. Processors receive it by mutable
//! reference and are the only code that changes case state.

use log::trace;

use crate::case::CaseId;
use crate::error::SimError;
use crate::event::{ContactEvent, EventStore, Time};
use crate::isolation::ContactIsolationPolicy;
use crate::population::Population;
use crate::properties::{
    ContactTracingProperties, DiseaseProperties, SimulationProperties, StandardProperties,
};
use crate::random::{Distribution, DistributionSampler};
use crate::statistics::StatisticsRecorder;

pub struct Context {
    standard: StandardProperties,
    disease: DiseaseProperties,
    contact_tracing: Option<ContactTracingProperties>,
    population: Population,
    event_store: EventStore,
    isolation: ContactIsolationPolicy,
    statistics: StatisticsRecorder,
    sampler: Box<dyn DistributionSampler>,
    current_time: Time,
    proportion_infectious: f64,
}

impl Context {
    /// Builds a context at time 0 with an empty event store.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` if the properties are invalid or the population
    /// does not have the configured size.
    pub fn new(
        properties: SimulationProperties,
        population: Population,
        sampler: Box<dyn DistributionSampler>,
    ) -> Result<Context, SimError> {
        properties.validate()?;
        let SimulationProperties {
            standard,
            disease,
            isolation,
            contact_tracing,
        } = properties;
        if population.len() != standard.population_size {
            return Err(SimError::InvalidConfiguration(format!(
                "population_size is {} but the population has {} cases",
                standard.population_size,
                population.len()
            )));
        }
        let isolation = ContactIsolationPolicy::new(
            isolation,
            standard.steps_per_day,
            disease.exposure_threshold,
        )?;
        Ok(Context {
            standard,
            disease,
            contact_tracing,
            population,
            event_store: EventStore::new(),
            isolation,
            statistics: StatisticsRecorder::new(),
            sampler,
            current_time: 0,
            proportion_infectious: 0.0,
        })
    }

    #[must_use]
    pub fn standard(&self) -> &StandardProperties {
        &self.standard
    }

    #[must_use]
    pub fn disease(&self) -> &DiseaseProperties {
        &self.disease
    }

    #[must_use]
    pub fn contact_tracing(&self) -> Option<&ContactTracingProperties> {
        self.contact_tracing.as_ref()
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub(crate) fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    #[must_use]
    pub fn event_store(&self) -> &EventStore {
        &self.event_store
    }

    pub(crate) fn event_store_mut(&mut self) -> &mut EventStore {
        &mut self.event_store
    }

    #[must_use]
    pub fn isolation(&self) -> &ContactIsolationPolicy {
        &self.isolation
    }

    #[must_use]
    pub fn statistics(&self) -> &StatisticsRecorder {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut StatisticsRecorder {
        &mut self.statistics
    }

    #[must_use]
    pub fn current_time(&self) -> Time {
        self.current_time
    }

    /// The proportion infectious as of the start of the current step.
    #[must_use]
    pub fn proportion_infectious(&self) -> f64 {
        self.proportion_infectious
    }

    /// Moves the clock to `time` and snapshots the proportion infectious for the step.
    pub(crate) fn begin_step(&mut self, time: Time) {
        self.current_time = time;
        self.proportion_infectious = self.population.proportion_infectious();
    }

    /// Schedules the recorded contact stream.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if a contact names a case outside the population, or an
    /// error if a contact falls in an already processed step.
    pub fn add_contacts(&mut self, contacts: Vec<ContactEvent>) -> Result<(), SimError> {
        for contact in contacts {
            for id in [contact.from, contact.to] {
                if !self.population.contains(id) {
                    return Err(SimError::UnknownCase(id));
                }
            }
            self.event_store.add_event(contact)?;
        }
        trace!(
            "{} contacts scheduled",
            self.event_store.pending::<ContactEvent>().len()
        );
        Ok(())
    }

    pub(crate) fn sample(&mut self, distribution: &Distribution) -> i64 {
        self.sampler.get_distribution_value(distribution)
    }

    pub(crate) fn uniform(&mut self) -> f64 {
        self.sampler.uniform_between_zero_and_one()
    }

    /// Draws a delay in days from `distribution` and converts it to steps, never less than one.
    pub(crate) fn sample_steps(&mut self, distribution: &Distribution) -> Time {
        (self.sample(distribution) * self.standard.steps_per_day).max(1)
    }

    /// Whether `contact` is suppressed by isolation, evaluated at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown case or an ambiguous isolation rule set.
    pub(crate) fn is_contact_isolated(&mut self, contact: &ContactEvent) -> Result<bool, SimError> {
        let from = self.population.get(contact.from)?;
        let to = self.population.get(contact.to)?;
        self.isolation.is_contact_isolated(
            from,
            to,
            contact.weight,
            self.proportion_infectious,
            self.current_time,
            self.sampler.as_mut(),
        )
    }

    /// Whether `id` isolates at the current time under the single-case rules.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown case or an ambiguous isolation rule set.
    pub fn is_isolating(&mut self, id: CaseId) -> Result<bool, SimError> {
        let case = self.population.get(id)?;
        self.isolation.single_case_mut().is_individual_in_isolation(
            case,
            self.proportion_infectious,
            self.current_time,
            self.sampler.as_mut(),
        )
    }
}
