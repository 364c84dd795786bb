//! Logging for projections. This is not to be confused with _reporting_, which writes the
//! projected trajectories and capacity indicators to CSV files.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!` where `error!` represents the highest-priority log messages and `trace!` the lowest.
//! Messages go to standard error so that standard output only carries results.
//!
//! Logging is _disabled_ by default. Logging messages can be enabled by passing the command line
//! option `--log-level <spec>`. Log messages can also be controlled programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! In addition, per-module filtering of messages can be configured using `set_module_filter()` /
//! `set_module_filters()` and `remove_module_filter()`, or all at once with `apply_log_spec()`:
//!
//! ```rust
//! use simulacovid::log::{apply_log_spec, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // `info` globally, and every derived rate set from the rates module.
//!     apply_log_spec("info,simulacovid::rates=debug").unwrap();
//!     // Silence the per-run integration summaries.
//!     set_module_filter("simulacovid::integrator", LevelFilter::Off);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::SimulacovidError;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Different log level filters can be applied to the log messages emitted from different modules
/// according to the module path (e.g. `"simulacovid::rates"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    /// The module path this configuration applies to
    module: String,
    /// The maximum log level for this module path
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Keeps track of the filter levels of modules and holds a handle to the global logger.
///
/// Loggers are installed globally, so only the instance behind `LOG_CONFIGURATION` exists. The
/// public API are free functions which fetch it and call the appropriate member function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules ("targets") without an explicitly set filter.
    /// `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn set_module_filters<S: AsRef<str>>(
        &mut self,
        module_filters: &[(S, LevelFilter)],
    ) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module.as_ref(), *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// A global level and module filters parsed from `"level,module=level,..."`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSpec {
    pub level: Option<LevelFilter>,
    pub module_filters: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SimulacovidError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parse_level = |level: &str| {
            LevelFilter::from_str(level.trim()).map_err(|_| {
                SimulacovidError::ConfigError(format!("unknown log level `{}`", level.trim()))
            })
        };
        let mut parsed = LogSpec {
            level: None,
            module_filters: Vec::new(),
        };
        for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((module, level)) => parsed
                    .module_filters
                    .push((module.trim().to_string(), parse_level(level)?)),
                None => parsed.level = Some(parse_level(directive)?),
            }
        }
        Ok(parsed)
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    let mut log_configuration = get_log_configuration();
    log_configuration.remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters<S: AsRef<str>>(module_filters: &[(S, LevelFilter)]) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filters(module_filters);
}

/// Applies a spec such as `"info,simulacovid::rates=debug"`. A bare level sets the global level;
/// `module=level` sets a module filter.
///
/// # Errors
/// `ConfigError` for an unknown level name. Nothing is applied in that case.
pub fn apply_log_spec(spec: &str) -> Result<(), SimulacovidError> {
    let spec: LogSpec = spec.parse()?;
    let mut log_configuration = get_log_configuration();
    if !spec.module_filters.is_empty() {
        log_configuration.set_module_filters(spec.module_filters.as_slice());
    }
    if let Some(level) = spec.level {
        log_configuration.set_log_level(level);
    }
    Ok(())
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    // A panic while holding the lock leaves the filters themselves consistent.
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{
        apply_log_spec, get_log_configuration, remove_module_filter, set_log_level,
        set_module_filters, LogSpec,
    };
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // Force logging tests to run serially for consistent behavior.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        set_log_level(LevelFilter::Trace);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Trace);
            assert_eq!(log::max_level(), LevelFilter::Trace);
            trace!("test_set_log_level: global set to trace");
        }
    }

    #[test]
    fn test_set_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        let filters = [
            ("simulacovid::integrator", LevelFilter::Error),
            ("simulacovid::rates", LevelFilter::Debug),
        ];
        set_module_filters(&filters);
        {
            let config = get_log_configuration();
            for (module_path, level) in &filters {
                assert_eq!(
                    config.module_configurations.get(*module_path),
                    Some(&((*module_path, *level).into()))
                );
            }
        }

        remove_module_filter("simulacovid::integrator");
        {
            let config = get_log_configuration();
            assert!(!config
                .module_configurations
                .contains_key("simulacovid::integrator"));
            assert_eq!(
                config.module_configurations.get("simulacovid::rates"),
                Some(&("simulacovid::rates", LevelFilter::Debug).into())
            );
        }
        remove_module_filter("simulacovid::rates");
    }

    #[test]
    fn test_parse_log_spec() {
        let spec: LogSpec = "info, simulacovid::rates=debug ,".parse().unwrap();
        assert_eq!(spec.level, Some(LevelFilter::Info));
        assert_eq!(
            spec.module_filters,
            vec![("simulacovid::rates".to_string(), LevelFilter::Debug)]
        );
        assert!("loud".parse::<LogSpec>().is_err());
        assert!("simulacovid=loud".parse::<LogSpec>().is_err());
    }

    #[test]
    fn test_apply_log_spec() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        apply_log_spec("warn,simulacovid::scenario=trace").unwrap();
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Warn);
            assert_eq!(
                config.module_configurations.get("simulacovid::scenario"),
                Some(&("simulacovid::scenario", LevelFilter::Trace).into())
            );
        }
        assert!(apply_log_spec("verbose").is_err());
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Warn);
        remove_module_filter("simulacovid::scenario");
        set_log_level(LevelFilter::Off);
    }
}
