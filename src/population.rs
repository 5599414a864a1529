//! The authoritative collection of cases.
//!
//! A `Population` owns every [`Case`]; ids are dense indices so lookups are a bounds check.
//! Status setters validate the change against the state machines before writing it, which
//! keeps the processors from ever leaving a case in an unreachable state.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::case::{Case, CaseId, ExposedBy};
use crate::error::SimError;
use crate::event::Time;
use crate::status::{AlertStatus, VirusStatus};

/// Count of cases per virus compartment at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmptRecord {
    pub time: Time,
    pub s: usize,
    pub e: usize,
    pub a: usize,
    pub p: usize,
    pub sym: usize,
    pub sev: usize,
    pub r: usize,
    pub d: usize,
}

impl CmptRecord {
    fn count(&mut self, status: VirusStatus) {
        let slot = match status {
            VirusStatus::Susceptible => &mut self.s,
            VirusStatus::Exposed => &mut self.e,
            VirusStatus::Asymptomatic => &mut self.a,
            VirusStatus::Presymptomatic => &mut self.p,
            VirusStatus::Symptomatic => &mut self.sym,
            VirusStatus::SeverelySymptomatic => &mut self.sev,
            VirusStatus::Recovered => &mut self.r,
            VirusStatus::Dead => &mut self.d,
        };
        *slot += 1;
    }

    /// Cases in a compartment that is neither susceptible nor terminal.
    #[must_use]
    pub fn active(&self) -> usize {
        self.e + self.a + self.p + self.sym + self.sev
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.s + self.active() + self.r + self.d
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    cases: Vec<Case>,
}

impl Population {
    /// Builds a population from cases whose ids are exactly `0..cases.len()`, in any order.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` if the ids are not dense and unique.
    pub fn new(mut cases: Vec<Case>) -> Result<Population, SimError> {
        cases.sort_by_key(|case| case.id);
        for (index, case) in cases.iter().enumerate() {
            if case.id.index() != index {
                return Err(SimError::InvalidConfiguration(format!(
                    "case ids must be unique and contiguous from 0; expected {index}, found {}",
                    case.id
                )));
            }
        }
        Ok(Population { cases })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }

    #[must_use]
    pub fn contains(&self, id: CaseId) -> bool {
        id.index() < self.cases.len()
    }

    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn get(&self, id: CaseId) -> Result<&Case, SimError> {
        self.cases.get(id.index()).ok_or(SimError::UnknownCase(id))
    }

    fn get_mut(&mut self, id: CaseId) -> Result<&mut Case, SimError> {
        self.cases.get_mut(id.index()).ok_or(SimError::UnknownCase(id))
    }

    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn virus_status(&self, id: CaseId) -> Result<VirusStatus, SimError> {
        Ok(self.get(id)?.virus_status)
    }

    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn alert_status(&self, id: CaseId) -> Result<AlertStatus, SimError> {
        Ok(self.get(id)?.alert_status)
    }

    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn is_infectious(&self, id: CaseId) -> Result<bool, SimError> {
        Ok(self.get(id)?.is_infectious())
    }

    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn health(&self, id: CaseId) -> Result<f64, SimError> {
        Ok(self.get(id)?.health)
    }

    /// Moves the case to `status` and returns the status it left.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` if `status` does not follow the current status.
    pub fn set_virus_status(
        &mut self,
        id: CaseId,
        status: VirusStatus,
    ) -> Result<VirusStatus, SimError> {
        let case = self.get_mut(id)?;
        let previous = case.virus_status;
        case.virus_status = previous.transition_to(status)?;
        Ok(previous)
    }

    /// Moves the case to `status` and returns the status it left.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` if `status` does not follow the current status.
    pub fn set_alert_status(
        &mut self,
        id: CaseId,
        status: AlertStatus,
    ) -> Result<AlertStatus, SimError> {
        let case = self.get_mut(id)?;
        let previous = case.alert_status;
        case.alert_status = previous.transition_to(status)?;
        Ok(previous)
    }

    /// Records the source and time of a case's exposure.
    ///
    /// # Errors
    ///
    /// Returns `SimError::UnknownCase` if `id` is outside the population.
    pub fn set_exposure(
        &mut self,
        id: CaseId,
        exposed_by: ExposedBy,
        exposed_time: Time,
    ) -> Result<(), SimError> {
        let case = self.get_mut(id)?;
        case.exposed_by = Some(exposed_by);
        case.exposed_time = Some(exposed_time);
        Ok(())
    }

    /// Compartment counts, stamped with `time`.
    #[must_use]
    pub fn counts(&self, time: Time) -> CmptRecord {
        let mut record = CmptRecord {
            time,
            ..CmptRecord::default()
        };
        for case in &self.cases {
            record.count(case.virus_status);
        }
        record
    }

    /// Number of cases in each compartment, in compartment order.
    #[must_use]
    pub fn status_histogram(&self) -> Vec<(VirusStatus, usize)> {
        VirusStatus::iter()
            .map(|status| {
                let count = self
                    .cases
                    .iter()
                    .filter(|case| case.virus_status == status)
                    .count();
                (status, count)
            })
            .collect()
    }

    #[must_use]
    pub fn active_cases(&self) -> usize {
        self.cases
            .iter()
            .filter(|case| case.virus_status.is_active())
            .count()
    }

    /// Fraction of the population currently infectious, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn proportion_infectious(&self) -> f64 {
        if self.cases.is_empty() {
            return 0.0;
        }
        let infectious = self
            .cases
            .iter()
            .filter(|case| case.is_infectious())
            .count();
        infectious as f64 / self.cases.len() as f64
    }

    /// Ids of all susceptible cases, ascending.
    #[must_use]
    pub fn susceptible_ids(&self) -> Vec<CaseId> {
        self.cases
            .iter()
            .filter(|case| case.virus_status == VirusStatus::Susceptible)
            .map(|case| case.id)
            .collect()
    }

    /// Overwrites a case's statuses without validation. Test fixtures only.
    #[cfg(test)]
    pub(crate) fn force_status(&mut self, id: CaseId, virus: VirusStatus, alert: AlertStatus) {
        let case = &mut self.cases[id.index()];
        case.virus_status = virus;
        case.alert_status = alert;
    }
}
