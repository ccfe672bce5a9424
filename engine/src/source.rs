//! Where the engine gets rules, settings, and aliases on each (re)load.

use tabsort_config::FileConfigSource;
use tabsort_types::Configuration;

/// Supplies configuration for a bootstrap. Called again on every reload.
///
/// Absent or unusable configuration is the empty `Configuration`, never an
/// error: reconciliation always proceeds.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Configuration;
}

impl ConfigSource for Configuration {
    fn load(&self) -> Configuration {
        self.clone()
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Configuration {
        self.configuration()
    }
}
