use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::event::Time;
use crate::status::{AlertStatus, VirusStatus};

/// Identifies a case; ids are the case's index in the `Population`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub u32);

impl CaseId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an exposure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposedBy {
    /// Seeded at the start of the run.
    Initial,
    /// Background infection from outside the contact network.
    Random,
    Case(CaseId),
}

impl Display for ExposedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposedBy::Initial => write!(f, "initial"),
            ExposedBy::Random => write!(f, "random"),
            ExposedBy::Case(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// One simulated individual.
///
/// The demographic and behavioral attributes are fixed when the population is built. The
/// epidemiological state is only reachable mutably through `Population`, which routes every
/// status change through the state machines.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: CaseId,
    /// In `[0, 1]`; higher health biases progression toward milder outcomes.
    pub health: f64,
    pub isolation_compliance: f64,
    pub reporting_compliance: f64,
    pub age: u32,
    pub gender: Gender,
    pub(crate) virus_status: VirusStatus,
    pub(crate) alert_status: AlertStatus,
    pub(crate) exposed_by: Option<ExposedBy>,
    pub(crate) exposed_time: Option<Time>,
}

impl Case {
    /// A susceptible, un-alerted case with the given attributes.
    #[must_use]
    pub fn new(
        id: CaseId,
        health: f64,
        isolation_compliance: f64,
        reporting_compliance: f64,
        age: u32,
        gender: Gender,
    ) -> Case {
        Case {
            id,
            health,
            isolation_compliance,
            reporting_compliance,
            age,
            gender,
            virus_status: VirusStatus::Susceptible,
            alert_status: AlertStatus::None,
            exposed_by: None,
            exposed_time: None,
        }
    }

    #[must_use]
    pub fn virus_status(&self) -> VirusStatus {
        self.virus_status
    }

    #[must_use]
    pub fn alert_status(&self) -> AlertStatus {
        self.alert_status
    }

    #[must_use]
    pub fn exposed_by(&self) -> Option<ExposedBy> {
        self.exposed_by
    }

    #[must_use]
    pub fn exposed_time(&self) -> Option<Time> {
        self.exposed_time
    }

    #[must_use]
    pub fn is_infectious(&self) -> bool {
        self.virus_status.is_infectious()
    }
}
