//! Loaders for the files a run is built from: the JSON properties file, the population and
//! contact CSVs, and the JSON list of initial cases.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::case::{Case, CaseId, Gender};
use crate::error::SimError;
use crate::event::{ContactEvent, Time};
use crate::population::Population;
use crate::properties::SimulationProperties;

/// Reads and validates a properties file.
///
/// # Errors
///
/// Returns an `IoError` or `JsonError` if the file cannot be read or parsed, and
/// `InvalidConfiguration` if it does not describe a valid simulation.
pub fn load_properties(path: &Path) -> Result<SimulationProperties, SimError> {
    info!("loading properties from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let properties: SimulationProperties = serde_json::from_reader(reader)?;
    properties.validate()?;
    Ok(properties)
}

#[derive(Debug, Deserialize)]
struct PopulationRecord {
    id: CaseId,
    age: u32,
    gender: Gender,
    health: f64,
    isolation_compliance: f64,
    reporting_compliance: f64,
}

impl PopulationRecord {
    fn into_case(self) -> Result<Case, SimError> {
        for (name, value) in [
            ("health", self.health),
            ("isolation_compliance", self.isolation_compliance),
            ("reporting_compliance", self.reporting_compliance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidConfiguration(format!(
                    "case {}: {name} must be in [0, 1], got {value}",
                    self.id
                )));
            }
        }
        Ok(Case::new(
            self.id,
            self.health,
            self.isolation_compliance,
            self.reporting_compliance,
            self.age,
            self.gender,
        ))
    }
}

/// Reads a population CSV with columns
/// `id,age,gender,health,isolation_compliance,reporting_compliance`.
///
/// # Errors
///
/// Returns a `CsvError` for malformed rows and `InvalidConfiguration` for out-of-range
/// attributes or ids that are not `0..n`.
pub fn read_population(path: &Path) -> Result<Population, SimError> {
    let mut reader = csv::Reader::from_path(path)?;
    let cases = reader
        .deserialize::<PopulationRecord>()
        .map(|record| record?.into_case())
        .collect::<Result<Vec<Case>, SimError>>()?;
    info!("read {} cases from {}", cases.len(), path.display());
    Population::new(cases)
}

/// Reads a contact CSV with columns `time,from,to,weight`, in any time order.
///
/// # Errors
///
/// Returns a `CsvError` for malformed rows and `InvalidConfiguration` for negative times or
/// weights.
pub fn read_contacts(path: &Path) -> Result<Vec<ContactEvent>, SimError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut contacts = Vec::new();
    for record in reader.deserialize::<ContactEvent>() {
        let contact = record?;
        if contact.time < 0 || contact.weight < 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "contacts must have non-negative time and weight: {contact:?}"
            )));
        }
        contacts.push(contact);
    }
    let last: Option<Time> = contacts.iter().map(|contact| contact.time).max();
    info!(
        "read {} contacts from {} (last at {last:?})",
        contacts.len(),
        path.display()
    );
    Ok(contacts)
}

/// Reads a JSON array of case ids to seed at time 0. Duplicates are removed.
///
/// # Errors
///
/// Returns an `IoError` or `JsonError` if the file cannot be read or parsed.
pub fn read_initial_cases(path: &Path) -> Result<Vec<CaseId>, SimError> {
    let reader = BufReader::new(File::open(path)?);
    let mut ids: Vec<CaseId> = serde_json::from_reader(reader)?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
