use std::fmt::{self, Debug, Display};
use std::io;

use crate::case::CaseId;

/// Provides `SimError` and maps other errors to
/// convert to a `SimError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A property file parsed but describes an unusable simulation.
    InvalidConfiguration(String),
    /// The target status is not a successor of the current status.
    InvalidTransition {
        machine: &'static str,
        from: String,
        to: String,
    },
    /// A dwell time was requested for a pair of statuses the state machines
    /// never produce.
    UnreachableTransition(String),
    /// Tied highest-priority isolation rules disagree on their outcome.
    NonDeterministicPolicy(Vec<String>),
    UnknownCase(CaseId),
    SimError(String),
}

impl SimError {
    pub(crate) fn invalid_transition(
        machine: &'static str,
        from: impl Debug,
        to: impl Debug,
    ) -> SimError {
        SimError::InvalidTransition {
            machine,
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        SimError::CsvError(error)
    }
}

impl From<String> for SimError {
    fn from(error: String) -> Self {
        SimError::SimError(error)
    }
}

impl From<&str> for SimError {
    fn from(error: &str) -> Self {
        SimError::SimError(error.to_string())
    }
}

impl std::error::Error for SimError {}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidConfiguration(message) => {
                write!(f, "Error: invalid configuration: {message}")
            }
            SimError::InvalidTransition { machine, from, to } => {
                write!(f, "Error: invalid {machine} transition from {from} to {to}")
            }
            SimError::UnreachableTransition(message) => {
                write!(f, "Error: unreachable transition: {message}")
            }
            SimError::NonDeterministicPolicy(ids) => write!(
                f,
                "Error: isolation policies {} share the highest priority but differ in outcome",
                ids.join(", ")
            ),
            SimError::UnknownCase(id) => write!(f, "Error: no case with id {id}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
