use std::fmt::{self, Debug, Display};
use std::io;

use crate::compartment::Compartment;

/// Provides `SimulacovidError` and maps other errors to
/// convert to a `SimulacovidError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimulacovidError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A rate, fraction or reproduction number outside its domain, or a ratio whose
    /// denominator is zero.
    InvalidParameter(String),
    /// A compartment computed below zero from the observed inputs.
    NegativeState {
        compartment: Compartment,
        value: f64,
    },
    /// The integration produced a non-finite value.
    SolverFailure {
        day: usize,
        compartment: Compartment,
    },
    ConfigError(String),
    ReportError(String),
}

impl SimulacovidError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimulacovidError::InvalidParameter(message.into())
    }
}

impl From<io::Error> for SimulacovidError {
    fn from(error: io::Error) -> Self {
        SimulacovidError::IoError(error)
    }
}

impl From<serde_json::Error> for SimulacovidError {
    fn from(error: serde_json::Error) -> Self {
        SimulacovidError::JsonError(error)
    }
}

impl From<csv::Error> for SimulacovidError {
    fn from(error: csv::Error) -> Self {
        SimulacovidError::CSVError(error)
    }
}

impl std::error::Error for SimulacovidError {}

impl Display for SimulacovidError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulacovidError::InvalidParameter(message) => {
                write!(f, "Error: invalid parameter: {message}")
            }
            SimulacovidError::NegativeState { compartment, value } => {
                write!(f, "Error: compartment {compartment} is negative ({value})")
            }
            SimulacovidError::SolverFailure { day, compartment } => write!(
                f,
                "Error: integration produced a non-finite value for {compartment} on day {day}"
            ),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
