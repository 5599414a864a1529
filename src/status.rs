//! The two per-case state machines.
//!
//! `VirusStatus` tracks the true course of infection and `AlertStatus` tracks the
//! alerting/testing pipeline, which runs independently of the true infection state. Both are
//! closed enums whose variants carry a fixed set of valid successors; `transition_to` is the
//! only way the processors move a case between states.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::error::SimError;

/// Disease compartments, declared in increasing order of severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VirusStatus {
    Susceptible,
    Exposed,
    Asymptomatic,
    Presymptomatic,
    Symptomatic,
    SeverelySymptomatic,
    Recovered,
    Dead,
}

impl VirusStatus {
    #[must_use]
    pub fn valid_transitions(self) -> &'static [VirusStatus] {
        use VirusStatus::*;
        match self {
            Susceptible => &[Exposed],
            Exposed => &[Asymptomatic, Presymptomatic],
            Asymptomatic => &[Recovered],
            Presymptomatic => &[Symptomatic],
            Symptomatic => &[Recovered, SeverelySymptomatic],
            SeverelySymptomatic => &[Recovered, Dead],
            Recovered | Dead => &[],
        }
    }

    /// Returns `next` if it is a valid successor of `self`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` otherwise.
    pub fn transition_to(self, next: VirusStatus) -> Result<VirusStatus, SimError> {
        if self.valid_transitions().contains(&next) {
            Ok(next)
        } else {
            Err(SimError::invalid_transition("virus", self, next))
        }
    }

    #[must_use]
    pub fn is_infectious(self) -> bool {
        matches!(
            self,
            VirusStatus::Asymptomatic
                | VirusStatus::Presymptomatic
                | VirusStatus::Symptomatic
                | VirusStatus::SeverelySymptomatic
        )
    }

    /// Anything that has been exposed but has not yet left the disease.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            VirusStatus::Susceptible | VirusStatus::Recovered | VirusStatus::Dead
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    None,
    Alerted,
    RequestedTest,
    AwaitingResult,
    TestedPositive,
    TestedNegative,
}

impl AlertStatus {
    #[must_use]
    pub fn valid_transitions(self) -> &'static [AlertStatus] {
        use AlertStatus::*;
        match self {
            None => &[Alerted, RequestedTest],
            Alerted => &[RequestedTest],
            RequestedTest => &[AwaitingResult],
            AwaitingResult => &[TestedPositive, TestedNegative],
            TestedPositive | TestedNegative => &[None],
        }
    }

    /// Returns `next` if it is a valid successor of `self`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTransition` otherwise.
    pub fn transition_to(self, next: AlertStatus) -> Result<AlertStatus, SimError> {
        if self.valid_transitions().contains(&next) {
            Ok(next)
        } else {
            Err(SimError::invalid_transition("alert", self, next))
        }
    }
}
