use log::{debug, trace};

use crate::case::ExposedBy;
use crate::context::Context;
use crate::error::SimError;
use crate::event::{ContactEvent, InfectionEvent, ProcessedEventResult};
use crate::processor::EventProcessor;
use crate::status::VirusStatus;

/// Probability that a contact of `weight` transmits, given the logit `bias` of the probability
/// at unit weight. Zero for non-positive weights.
#[must_use]
pub fn exposure_probability(bias: f64, exponent: f64, weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + 1.0 / (bias.exp() * weight.powf(exponent)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContactEventProcessor;

impl EventProcessor for ContactEventProcessor {
    type Event = ContactEvent;

    fn process(
        &self,
        context: &mut Context,
        contact: &ContactEvent,
    ) -> Result<ProcessedEventResult, SimError> {
        let mut result = ProcessedEventResult::completed(*contact);

        if context.is_contact_isolated(contact)? {
            debug!(
                "contact {} <-> {} at {} suppressed by isolation",
                contact.from, contact.to, contact.time
            );
            return Ok(result);
        }

        let from_status = context.population().virus_status(contact.from)?;
        let to_status = context.population().virus_status(contact.to)?;
        if from_status == to_status {
            return Ok(result);
        }

        // The more severe party is the only possible spreader.
        let (spreader, spreader_status, target, target_status) = if from_status > to_status {
            (contact.from, from_status, contact.to, to_status)
        } else {
            (contact.to, to_status, contact.from, from_status)
        };
        if !spreader_status.is_infectious() || target_status != VirusStatus::Susceptible {
            return Ok(result);
        }

        let disease = context.disease();
        let probability = exposure_probability(
            disease.exposure_bias(),
            disease.exposure_exponent,
            contact.weight,
        );
        if context.uniform() < probability {
            trace!(
                "case {spreader} exposes case {target} at {} (p={probability:.3})",
                contact.time
            );
            result.add_new(InfectionEvent::exposure(
                contact.time + 1,
                target,
                ExposedBy::Case(spreader),
                contact.time,
            ));
        }
        Ok(result)
    }
}
