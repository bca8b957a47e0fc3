use clusterde::engine::config::{OutputConfig, PolishConfig, SolverConfig};

/// Values used when neither the command line nor the config file sets them.
pub struct DefaultsConfig {
    pub solver: SolverConfig,
    pub polish: PolishConfig,
    pub polish_enabled: bool,
    pub output: OutputConfig,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            polish: PolishConfig::default(),
            polish_enabled: true,
            output: OutputConfig::default(),
        }
    }
}
