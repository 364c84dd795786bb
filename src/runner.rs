use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::capacity::{dday, DdaySummary};
use crate::compartment::ModelVariant;
use crate::config::SimulationConfig;
use crate::error::SimulacovidError;
use crate::log::{apply_log_spec, info};
use crate::lookup::{PlaceParameterTable, PlaceParameters, RtEstimate, RtTable};
use crate::prepare::{prepare_simulation, PlaceLevel, PlaceRecord};
use crate::report::{write_dday_report, write_results, DdayRecord};
use crate::scenario::{Bound, NoProjection, Projection, ScenarioResults, ScenarioRunner};

/// Command line arguments of the `simulacovid` binary.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "simulacovid", version, about = "Projects hospital demand for one place")]
pub struct Args {
    /// Optional path for a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path of the JSON place input
    #[arg(short, long)]
    pub input: PathBuf,

    /// Optional CSV of severity fractions and fatality ratios by place
    #[arg(long)]
    pub places: Option<PathBuf>,

    /// Optional CSV of state reproduction number estimates
    #[arg(long)]
    pub state_rt: Option<PathBuf>,

    /// Optional directory for trajectory and capacity reports
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Model variant, overriding the configuration: SEIR or SEAPMDR
    #[arg(short, long)]
    pub model: Option<ModelVariant>,

    /// Administrative level of the place
    #[arg(long, default_value = "health_region")]
    pub level: PlaceLevel,

    /// Integrate both bounds concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Log level, optionally with module filters, e.g. `info,simulacovid::rates=debug`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// A place record together with the parameter rows it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInput {
    pub record: PlaceRecord,
    #[serde(default)]
    pub place_parameters: Vec<PlaceParameters>,
    #[serde(default)]
    pub state_rt: Vec<RtEstimate>,
}

/// A bound whose integration failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundFailure {
    pub bound: Bound,
    pub error: String,
}

/// What a run produced, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub place_id: String,
    pub model: ModelVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dday: Option<DdaySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BoundFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_projection: Option<NoProjection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<PathBuf>,
}

fn load_input(args: &Args) -> Result<(PlaceRecord, PlaceParameterTable, RtTable), SimulacovidError> {
    let input: PlaceInput = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
    let mut places = match &args.places {
        Some(path) => PlaceParameterTable::from_csv(path)?,
        None => PlaceParameterTable::new(),
    };
    for row in input.place_parameters {
        places.insert(row);
    }
    let mut rt = match &args.state_rt {
        Some(path) => RtTable::from_csv(path)?,
        None => RtTable::new(),
    };
    for estimate in input.state_rt {
        rt.insert(estimate);
    }
    Ok((input.record, places, rt))
}

fn failures(results: &ScenarioResults) -> Vec<BoundFailure> {
    [Bound::Worst, Bound::Best]
        .into_iter()
        .filter_map(|bound| {
            results.get(bound).err().map(|error| BoundFailure {
                bound,
                error: error.to_string(),
            })
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, SimulacovidError> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            SimulationConfig::load(path)
        }
        None => Ok(SimulationConfig::default()),
    }
}

/// Runs a projection with already parsed arguments.
///
/// # Errors
/// Returns an error if an input cannot be read, or the projection or a report fails.
pub fn run_with_args(args: &Args) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    if let Some(spec) = &args.log_level {
        apply_log_spec(spec)?;
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model = model;
    }
    let (record, places, rt) = load_input(args)?;
    let place_id = record.place_id(args.level)?.to_string();

    let mut outcome = RunOutcome {
        place_id: place_id.clone(),
        model: config.model,
        dday: None,
        failures: Vec::new(),
        no_projection: None,
        reports: Vec::new(),
    };

    let params = match prepare_simulation(&record, args.level, &config, &places, &rt)? {
        Projection::Available(params) => params,
        Projection::Unavailable(reason) => {
            info!("{place_id}: no projection ({reason})");
            outcome.no_projection = Some(reason);
            return Ok(outcome);
        }
    };

    let runner = ScenarioRunner::new(&config).parallel(args.parallel);
    let results = runner.run_bounds(&params.observation, &params.profile, params.rt)?;
    let summary = dday(&results, params.n_beds, params.n_icu_beds).summary();
    outcome.dday = Some(summary);
    outcome.failures = failures(&results);

    if let Some(dir) = &args.output_dir {
        outcome.reports = write_results(dir, &place_id, &results)?;
        let dday_path = dir.join(format!("{place_id}_dday.csv"));
        write_dday_report(&dday_path, &[DdayRecord::new(&place_id, &summary)])?;
        outcome.reports.push(dday_path);
    }
    Ok(outcome)
}

/// Parses the command line and runs a projection.
///
/// # Errors
/// See [`run_with_args`].
pub fn run() -> Result<RunOutcome, Box<dyn std::error::Error>> {
    run_with_args(&Args::parse())
}
