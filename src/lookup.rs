//! Place-specific parameter tables.
//!
//! Severity fractions are published per place (health region or state) while the fatality
//! ratio is published per state, so a profile is assembled from two rows. Reproduction
//! number estimates are published per state with an update date; only the most recent
//! estimate is used.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimulacovidError;
use crate::parameters::PlaceSeverityProfile;

/// One row of the place parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceParameters {
    pub place_id: String,
    pub i0_percentage: f64,
    pub i1_percentage: f64,
    pub i2_percentage: f64,
    pub i3_percentage: f64,
    pub fatality_ratio: f64,
}

pub trait PlaceParameterLookup {
    fn place_parameters(&self, place_id: &str) -> Option<&PlaceParameters>;

    /// Severity fractions of `place_id` with the fatality ratio of `state_id`.
    ///
    /// # Errors
    /// `InvalidParameter` if either place is unknown or the assembled profile is invalid.
    fn severity_profile(
        &self,
        place_id: &str,
        state_id: &str,
    ) -> Result<PlaceSeverityProfile, SimulacovidError> {
        let place = self.place_parameters(place_id).ok_or_else(|| {
            SimulacovidError::invalid(format!("no severity parameters for place {place_id}"))
        })?;
        let state = self.place_parameters(state_id).ok_or_else(|| {
            SimulacovidError::invalid(format!("no fatality ratio for state {state_id}"))
        })?;
        let profile = PlaceSeverityProfile {
            asymptomatic: place.i0_percentage,
            mild: place.i1_percentage,
            severe: place.i2_percentage,
            critical: place.i3_percentage,
            fatality_ratio: state.fatality_ratio,
            nosocomial_proportion: None,
        };
        profile.validate()?;
        Ok(profile)
    }
}

/// In-memory place parameter table keyed by place id.
#[derive(Debug, Clone, Default)]
pub struct PlaceParameterTable {
    rows: HashMap<String, PlaceParameters>,
}

impl PlaceParameterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row, replacing any previous row of the same place.
    pub fn insert(&mut self, row: PlaceParameters) {
        self.rows.insert(row.place_id.clone(), row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// # Errors
    /// `IoError` or `CSVError` if the file cannot be read or parsed.
    pub fn from_csv(path: &Path) -> Result<Self, SimulacovidError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// # Errors
    /// `CSVError` if a row cannot be parsed.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, SimulacovidError> {
        let mut table = PlaceParameterTable::new();
        for row in csv::Reader::from_reader(reader).deserialize() {
            table.insert(row?);
        }
        Ok(table)
    }
}

impl FromIterator<PlaceParameters> for PlaceParameterTable {
    fn from_iter<I: IntoIterator<Item = PlaceParameters>>(iter: I) -> Self {
        let mut table = PlaceParameterTable::new();
        for row in iter {
            table.insert(row);
        }
        table
    }
}

impl PlaceParameterLookup for PlaceParameterTable {
    fn place_parameters(&self, place_id: &str) -> Option<&PlaceParameters> {
        self.rows.get(place_id)
    }
}

/// A state-level reproduction number estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtEstimate {
    pub state_num_id: String,
    #[serde(rename = "Rt_most_likely")]
    pub most_likely: f64,
    #[serde(rename = "Rt_high_95")]
    pub high_95: f64,
    /// ISO-8601 date, so lexical order is chronological.
    pub last_updated: String,
}

pub trait RtLookup {
    /// The most recent estimate for `state_id`.
    fn state_rt(&self, state_id: &str) -> Option<&RtEstimate>;
}

/// In-memory history of state reproduction number estimates.
#[derive(Debug, Clone, Default)]
pub struct RtTable {
    estimates: HashMap<String, Vec<RtEstimate>>,
}

impl RtTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, estimate: RtEstimate) {
        self.estimates
            .entry(estimate.state_num_id.clone())
            .or_default()
            .push(estimate);
    }

    /// # Errors
    /// `IoError` or `CSVError` if the file cannot be read or parsed.
    pub fn from_csv(path: &Path) -> Result<Self, SimulacovidError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// # Errors
    /// `CSVError` if a row cannot be parsed.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, SimulacovidError> {
        let mut table = RtTable::new();
        for estimate in csv::Reader::from_reader(reader).deserialize() {
            table.insert(estimate?);
        }
        Ok(table)
    }
}

impl FromIterator<RtEstimate> for RtTable {
    fn from_iter<I: IntoIterator<Item = RtEstimate>>(iter: I) -> Self {
        let mut table = RtTable::new();
        for estimate in iter {
            table.insert(estimate);
        }
        table
    }
}

impl RtLookup for RtTable {
    fn state_rt(&self, state_id: &str) -> Option<&RtEstimate> {
        // max_by returns the last of equal elements, so reverse to keep the earliest row
        self.estimates
            .get(state_id)?
            .iter()
            .rev()
            .max_by(|a, b| a.last_updated.cmp(&b.last_updated))
    }
}
