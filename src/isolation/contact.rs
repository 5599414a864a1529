use log::trace;

use crate::case::Case;
use crate::error::SimError;
use crate::event::Time;
use crate::isolation::{IsolationProperties, SingleCaseIsolationPolicy};
use crate::random::DistributionSampler;

/// Decides whether a contact is suppressed by isolation.
///
/// A contact is suppressed when either party is isolating and the contact is weaker than the
/// exposure threshold; strong contacts (e.g. within a household) happen regardless.
#[derive(Debug, Clone)]
pub struct ContactIsolationPolicy {
    single_case: SingleCaseIsolationPolicy,
    exposure_threshold: f64,
}

impl ContactIsolationPolicy {
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` if the rule set is invalid.
    pub fn new(
        properties: IsolationProperties,
        steps_per_day: i64,
        exposure_threshold: f64,
    ) -> Result<ContactIsolationPolicy, SimError> {
        Ok(ContactIsolationPolicy {
            single_case: SingleCaseIsolationPolicy::new(properties, steps_per_day)?,
            exposure_threshold,
        })
    }

    #[must_use]
    pub fn single_case(&self) -> &SingleCaseIsolationPolicy {
        &self.single_case
    }

    pub fn single_case_mut(&mut self) -> &mut SingleCaseIsolationPolicy {
        &mut self.single_case
    }

    /// Both parties are always evaluated, `a` first, so the draws made do not depend on the
    /// outcome for `a`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NonDeterministicPolicy` if the rule set is ambiguous for either
    /// party.
    pub fn is_contact_isolated(
        &mut self,
        a: &Case,
        b: &Case,
        weight: f64,
        proportion_infected: f64,
        time: Time,
        sampler: &mut dyn DistributionSampler,
    ) -> Result<bool, SimError> {
        let a_isolating =
            self.single_case
                .is_individual_in_isolation(a, proportion_infected, time, sampler)?;
        let b_isolating =
            self.single_case
                .is_individual_in_isolation(b, proportion_infected, time, sampler)?;
        let isolated = (a_isolating || b_isolating) && weight < self.exposure_threshold;
        if isolated {
            trace!("contact {} <-> {} at {time} suppressed", a.id, b.id);
        }
        Ok(isolated)
    }
}
