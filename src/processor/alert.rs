use std::collections::BTreeSet;

use log::{debug, trace};

use crate::case::CaseId;
use crate::context::Context;
use crate::error::SimError;
use crate::event::{AlertEvent, ContactEvent, ProcessedEventResult, Time};
use crate::processor::EventProcessor;
use crate::properties::ContactTracingProperties;
use crate::status::AlertStatus;

/// Advances a case through the alert and testing pipeline.
///
/// Alerts whose expected status no longer matches the case are stale and dropped. A positive
/// result traces the case's recent contacts when tracing is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEventProcessor;

impl AlertEventProcessor {
    /// The alert status that follows `status`; `None` ends the pipeline.
    fn next_status(
        context: &mut Context,
        id: CaseId,
        status: AlertStatus,
    ) -> Result<AlertStatus, SimError> {
        let next = match status {
            AlertStatus::None => AlertStatus::None,
            AlertStatus::Alerted => AlertStatus::RequestedTest,
            AlertStatus::RequestedTest => AlertStatus::AwaitingResult,
            AlertStatus::AwaitingResult => Self::test_result(context, id)?,
            AlertStatus::TestedPositive | AlertStatus::TestedNegative => AlertStatus::None,
        };
        Ok(next)
    }

    /// Tests a case against its true infectious state. Configured accuracies add a uniform
    /// draw that can flip the result; flipped results are counted.
    fn test_result(context: &mut Context, id: CaseId) -> Result<AlertStatus, SimError> {
        let infectious = context.population().is_infectious(id)?;
        let disease = context.disease();
        let (accuracy, correct, wrong) = if infectious {
            (
                disease.test_positive_accuracy,
                AlertStatus::TestedPositive,
                AlertStatus::TestedNegative,
            )
        } else {
            (
                disease.test_negative_accuracy,
                AlertStatus::TestedNegative,
                AlertStatus::TestedPositive,
            )
        };
        let Some(accuracy) = accuracy else {
            return Ok(correct);
        };
        if context.uniform() < accuracy {
            return Ok(correct);
        }
        let statistics = context.statistics_mut();
        if infectious {
            statistics.record_false_negative();
        } else {
            statistics.record_false_positive();
        }
        Ok(wrong)
    }

    /// Alerts every distinct counterpart of `id` among the completed contacts of the tracing
    /// window, in ascending id order.
    fn trace_contacts(
        context: &mut Context,
        id: CaseId,
        time: Time,
        tracing: ContactTracingProperties,
        result: &mut ProcessedEventResult,
    ) {
        let window = tracing.window_days * context.standard().steps_per_day;
        let contacts: BTreeSet<CaseId> = context
            .event_store()
            .completed::<ContactEvent>()
            .range(time - window, time)
            .filter(|contact| contact.weight >= tracing.min_weight)
            .filter_map(|contact| contact.counterpart(id))
            .filter(|other| *other != id)
            .collect();

        trace!("case {id} tested positive at {time}; alerting {} contacts", contacts.len());
        context.statistics_mut().record_traced_alerts(contacts.len());
        for other in contacts {
            result.add_new(AlertEvent {
                time: time + 1,
                id: other,
                old_status: AlertStatus::None,
                next_status: AlertStatus::Alerted,
            });
        }
    }
}

impl EventProcessor for AlertEventProcessor {
    type Event = AlertEvent;

    fn process(
        &self,
        context: &mut Context,
        event: &AlertEvent,
    ) -> Result<ProcessedEventResult, SimError> {
        let mut result = ProcessedEventResult::completed(*event);
        let id = event.id;

        let current = context.population().alert_status(id)?;
        if current != event.old_status {
            debug!(
                "dropping stale alert {:?} -> {:?} for case {id} at {}: status is {current:?}",
                event.old_status, event.next_status, event.time
            );
            return Ok(result);
        }

        context
            .population_mut()
            .set_alert_status(id, event.next_status)?;
        let status = event.next_status;
        trace!("case {id} alert status is {status:?} at {}", event.time);

        if status == AlertStatus::TestedPositive {
            if let Some(tracing) = context.contact_tracing().copied() {
                Self::trace_contacts(context, id, event.time, tracing, &mut result);
            }
        }

        let next = Self::next_status(context, id, status)?;
        if next != status {
            let distribution = context.disease().alert_time(status, next)?;
            let delay = context.sample_steps(&distribution);
            result.add_new(AlertEvent {
                time: event.time + delay,
                id,
                old_status: status,
                next_status: next,
            });
        }
        Ok(result)
    }
}
