/*!

A "logger" that does not output anything anywhere but satisfies the public API when the `logging`
feature is off.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global logger to conform to this `LogConfiguration`.
    pub(in crate::log) fn set_config(&mut self) {
        // No global logger; the level still gates the macros.
        let max = self
            .module_configurations
            .values()
            .map(|module| module.level)
            .fold(self.global_log_level, std::cmp::max);
        log::set_max_level(max);
    }
}
