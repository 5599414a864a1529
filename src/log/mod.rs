//! Diagnostic logging for the simulator. This is not to be confused with _reporting_: reports
//! are the CSV outputs of a run, while log messages describe what the kernel is doing.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`, where `error!` represents the highest-priority log messages and `trace!` the lowest.
//! The kernel logs one `info!` line per simulated day, `debug!` lines for dropped stale events and
//! suppressed contacts, and `trace!` lines for every state change.
//!
//! Logging is _disabled_ by default. It can be enabled by passing the command line option
//! `--log-level <level>` or programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filtering is configured using `set_module_filter()` / `set_module_filters()` and
//! `remove_module_filter()`:
//!
//! ```rust
//! use contact_tracing_sim::log::{set_module_filter, set_log_level, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Enable `info` log messages globally.
//!     set_log_level(LevelFilter::Info);
//!     // Show every isolation decision.
//!     set_module_filter("contact_tracing_sim::isolation", LevelFilter::Trace);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::str::FromStr;

use crate::error::SimError;
use crate::hashing::HashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Default module specific filters
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] = [
    // One line per contact per step is too noisy for a global `trace`.
    ("contact_tracing_sim::isolation", LevelFilter::Info),
];

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter applied to the messages of one module path (e.g.
/// `"contact_tracing_sim::processor"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
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

/// Tracks the filter levels of modules and holds a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct exists. The public
/// API are free functions which fetch the singleton and call the matching method.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. `LevelFilter::Off`
    /// disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,

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

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
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
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Applies a `--log-level` argument: either a single level (`info`), which becomes the global
/// level, or a comma separated list of `module=level` pairs, which sets each module's filter and
/// leaves every other module silent. Returns the applied module filters.
///
/// # Errors
///
/// Returns `SimError::InvalidConfiguration` for an unknown level name.
pub fn apply_log_level_arg(arg: &str) -> Result<Vec<(String, LevelFilter)>, SimError> {
    let parse_level = |level: &str| {
        LevelFilter::from_str(level.trim()).map_err(|_| {
            SimError::InvalidConfiguration(format!("unknown log level `{}`", level.trim()))
        })
    };

    if !arg.contains('=') {
        set_log_level(parse_level(arg)?);
        return Ok(Vec::new());
    }

    let mut filters = Vec::new();
    for pair in arg.split(',').filter(|pair| !pair.trim().is_empty()) {
        let Some((module, level)) = pair.split_once('=') else {
            return Err(SimError::InvalidConfiguration(format!(
                "expected `module=level`, got `{pair}`"
            )));
        };
        filters.push((module.trim().to_string(), parse_level(level)?));
    }
    let borrowed: Vec<(&str, LevelFilter)> = filters
        .iter()
        .map(|(module, level)| (module.as_str(), *level))
        .collect();
    {
        let mut log_configuration = get_log_configuration();
        log_configuration.set_module_filters(&borrowed);
        // Module filters only narrow what the root lets through.
        log_configuration.set_log_level(LevelFilter::Off);
    }
    Ok(filters)
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{
        apply_log_level_arg, get_log_configuration, remove_module_filter, set_log_level,
        set_module_filters,
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
            trace!("test_set_log_level: global set to trace");
        }
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filters() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        remove_module_filter("contact_tracing_sim::processor");
        {
            let config = get_log_configuration();
            assert_eq!(
                config
                    .module_configurations
                    .get("contact_tracing_sim::isolation")
                    .map(|c| c.level),
                Some(LevelFilter::Info)
            );
        }

        let filters = [
            ("contact_tracing_sim::isolation", LevelFilter::Error),
            ("contact_tracing_sim::processor", LevelFilter::Debug),
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

        remove_module_filter("contact_tracing_sim::processor");
        {
            let config = get_log_configuration();
            assert!(!config
                .module_configurations
                .contains_key("contact_tracing_sim::processor"));
        }
        set_module_filters(&[("contact_tracing_sim::isolation", LevelFilter::Info)]);
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn test_log_level_arg() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        assert!(apply_log_level_arg("info").unwrap().is_empty());
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Info);

        let filters = apply_log_level_arg("contact_tracing_sim::event_runner=Debug").unwrap();
        assert_eq!(
            filters,
            vec![(
                "contact_tracing_sim::event_runner".to_string(),
                LevelFilter::Debug
            )]
        );
        assert!(apply_log_level_arg("loud").is_err());
        assert!(apply_log_level_arg("a=b=c,d").is_err());

        remove_module_filter("contact_tracing_sim::event_runner");
        set_log_level(LevelFilter::Off);
    }
}
