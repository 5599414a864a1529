//! CSV outputs of a finished run.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::error::SimError;
use crate::event::Time;
use crate::statistics::StatisticsRecorder;

/// File name of the daily compartment counts within an output directory.
pub const DAILY_RECORDS_FILE: &str = "daily_records.csv";
/// File name of the infection map within an output directory.
pub const INFECTION_MAP_FILE: &str = "infection_map.csv";

// Checks that the path is valid. Creates the file and all parent directories if they do not
// exist.
fn generate_validate_filepath(path: &Path) -> Result<File, SimError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(SimError::InvalidConfiguration(format!(
            "report output files must be CSVs: {}",
            path.display()
        ))),
    }
}

fn csv_writer(path: &Path) -> Result<Writer<File>, SimError> {
    Ok(Writer::from_writer(generate_validate_filepath(path)?))
}

#[derive(Serialize)]
struct DailyRow {
    day: i64,
    time: Time,
    s: usize,
    e: usize,
    a: usize,
    p: usize,
    sym: usize,
    sev: usize,
    r: usize,
    d: usize,
}

#[derive(Serialize)]
struct InfectionRow {
    time: Time,
    infectee: u32,
    /// A case id, `initial` or `random`.
    infector: String,
}

/// Writes one row of compartment counts per simulated day.
///
/// # Errors
///
/// Returns an error if `path` is not a `.csv` path or cannot be written.
pub fn write_daily_records(path: &Path, statistics: &StatisticsRecorder) -> Result<(), SimError> {
    let mut writer = csv_writer(path)?;
    for (day, record) in statistics.daily_records() {
        writer.serialize(DailyRow {
            day,
            time: record.time,
            s: record.s,
            e: record.e,
            a: record.a,
            p: record.p,
            sym: record.sym,
            sev: record.sev,
            r: record.r,
            d: record.d,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the infection tree, one edge per row, in infection order.
///
/// # Errors
///
/// Returns an error if `path` is not a `.csv` path or cannot be written.
pub fn write_infection_map(path: &Path, statistics: &StatisticsRecorder) -> Result<(), SimError> {
    let mut writer = csv_writer(path)?;
    for record in statistics.infections() {
        writer.serialize(InfectionRow {
            time: record.time,
            infectee: record.infectee.0,
            infector: record.infector.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
