use crate::capacity::DdaySummary;
use crate::error::SimulacovidError;
use crate::scenario::ScenarioResults;
use crate::trajectory::Trajectory;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::{Path, PathBuf};

/// One row of the capacity report. An empty field marks a bound whose integration failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdayRecord {
    pub place_id: String,
    pub beds_worst: Option<i64>,
    pub beds_best: Option<i64>,
    pub icu_beds_worst: Option<i64>,
    pub icu_beds_best: Option<i64>,
}

impl DdayRecord {
    #[must_use]
    pub fn new(place_id: &str, summary: &DdaySummary) -> Self {
        DdayRecord {
            place_id: place_id.to_string(),
            beds_worst: summary.beds.worst,
            beds_best: summary.beds.best,
            icu_beds_worst: summary.icu_beds.worst,
            icu_beds_best: summary.icu_beds.best,
        }
    }
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful.
fn generate_validate_filepath(path: &Path) -> Result<File, SimulacovidError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            let parent = path.parent().ok_or_else(|| {
                SimulacovidError::ReportError("Either root or empty path provided".to_string())
            })?;
            create_dir_all(parent)?;
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SimulacovidError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Column names of a trajectory report: `dias`, the variant's compartments, `N`, `E`,
/// `scenario`, `model` and `bound`.
#[must_use]
pub fn trajectory_header(trajectory: &Trajectory) -> Vec<String> {
    let mut header = vec!["dias".to_string()];
    header.extend(
        trajectory
            .model
            .compartments()
            .into_iter()
            .map(|c| c.to_string()),
    );
    header.extend(["N", "E", "scenario", "model", "bound"].map(String::from));
    header
}

/// Writes the header and one row per day.
///
/// # Errors
/// `CSVError` if writing fails.
pub fn write_trajectory<W: io::Write>(
    writer: &mut Writer<W>,
    trajectory: &Trajectory,
) -> Result<(), SimulacovidError> {
    writer.write_record(trajectory_header(trajectory))?;
    for row in trajectory.rows() {
        let mut record = vec![row.dias.to_string()];
        record.extend(row.compartments.iter().map(|(_, value)| value.to_string()));
        record.push(row.n.to_string());
        record.push(row.e.to_string());
        record.push(row.scenario.to_string());
        record.push(row.model.to_string());
        record.push(row.bound.map(|b| b.to_string()).unwrap_or_default());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one trajectory to a CSV file, creating parent directories.
///
/// # Errors
/// `ReportError` unless the path ends in `.csv`; I/O and CSV errors otherwise.
pub fn write_trajectory_report(path: &Path, trajectory: &Trajectory) -> Result<(), SimulacovidError> {
    let file = generate_validate_filepath(path)?;
    write_trajectory(&mut Writer::from_writer(file), trajectory)
}

/// Writes `{prefix}_{bound}.csv` in `dir` for every bound that integrated successfully.
/// Returns the written paths, worst first.
///
/// # Errors
/// See [`write_trajectory_report`].
pub fn write_results(
    dir: &Path,
    prefix: &str,
    results: &ScenarioResults,
) -> Result<Vec<PathBuf>, SimulacovidError> {
    let mut written = Vec::new();
    for trajectory in results.trajectories() {
        let name = match trajectory.bound {
            Some(bound) => format!("{prefix}_{bound}.csv"),
            None => format!("{prefix}.csv"),
        };
        let path = dir.join(name);
        write_trajectory_report(&path, trajectory)?;
        written.push(path);
    }
    Ok(written)
}

/// Writes capacity records to a CSV file, `-1` standing for capacity never exceeded and an
/// empty field for a failed bound.
///
/// # Errors
/// `ReportError` unless the path ends in `.csv`; I/O and CSV errors otherwise.
pub fn write_dday_report(path: &Path, records: &[DdayRecord]) -> Result<(), SimulacovidError> {
    let file = generate_validate_filepath(path)?;
    let mut writer = Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
