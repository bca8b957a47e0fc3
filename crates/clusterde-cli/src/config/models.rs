use clusterde::core::models::cluster::Cluster;
use clusterde::engine::config as core_config;

/// Everything a run needs once the command line and config file are merged.
pub struct AppConfig {
    pub cluster: Cluster,
    pub core_config: core_config::OptimizationConfig,
}
