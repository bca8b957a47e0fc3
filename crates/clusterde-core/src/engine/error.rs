use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::xyz::XyzError;
use crate::core::models::cluster::ClusterError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid cluster: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Executable '{name}' was not found. Install it, add it to PATH, or configure its path explicitly.")]
    ExecutableNotFound { name: String },

    #[error("File operation on '{path}' failed: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to record structure to '{path}': {source}", path = path.display())]
    Trajectory {
        path: PathBuf,
        #[source]
        source: XyzError,
    },

    #[error("Failed to record generation history to '{path}': {source}", path = path.display())]
    History {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Local refinement failed: {0}")]
    Polish(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
