use crate::core::models::cluster::Cluster;
use crate::core::programs::parser::{self, EnergyParseError, FAILURE_PENALTY};
use crate::core::programs::runner::ProgramRunner;
use crate::core::programs::Job;
use crate::core::utils::geometry::GeometryError;
use crate::engine::config::ProgramConfig;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, trace, warn};

const SCRATCH_PREFIX: &str = "clusterde-";

/// Why a single energy evaluation produced no energy.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Executable '{name}' was not found")]
    ExecutableNotFound { name: String },

    #[error("External program failed ({})", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("Program log has no line containing '{marker}'")]
    MarkerNotFound { marker: String },

    #[error("Energy line could not be parsed: '{line}'")]
    MalformedEnergy { line: String },

    #[error("Invalid candidate geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("I/O error during evaluation: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl From<EnergyParseError> for EvaluationError {
    fn from(err: EnergyParseError) -> Self {
        match err {
            EnergyParseError::MarkerNotFound { marker } => Self::MarkerNotFound { marker },
            EnergyParseError::MalformedEnergy { line, .. } => Self::MalformedEnergy { line },
        }
    }
}

/// Plain counts of evaluation outcomes, grouped by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub evaluations: usize,
    pub successes: usize,
    pub executable_not_found: usize,
    pub non_zero_exit: usize,
    pub marker_not_found: usize,
    pub malformed_energy: usize,
    pub other_failures: usize,
}

impl EvaluationSummary {
    pub fn failures(&self) -> usize {
        self.evaluations - self.successes
    }
}

#[derive(Debug, Default)]
struct EvaluationStats {
    evaluations: AtomicUsize,
    successes: AtomicUsize,
    executable_not_found: AtomicUsize,
    non_zero_exit: AtomicUsize,
    marker_not_found: AtomicUsize,
    malformed_energy: AtomicUsize,
    other_failures: AtomicUsize,
}

impl EvaluationStats {
    fn record(&self, outcome: &Result<f64, EvaluationError>) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Ok(_) => &self.successes,
            Err(EvaluationError::ExecutableNotFound { .. }) => &self.executable_not_found,
            Err(EvaluationError::NonZeroExit { .. }) => &self.non_zero_exit,
            Err(EvaluationError::MarkerNotFound { .. }) => &self.marker_not_found,
            Err(EvaluationError::MalformedEnergy { .. }) => &self.malformed_energy,
            Err(_) => &self.other_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> EvaluationSummary {
        EvaluationSummary {
            evaluations: self.evaluations.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            executable_not_found: self.executable_not_found.load(Ordering::Relaxed),
            non_zero_exit: self.non_zero_exit.load(Ordering::Relaxed),
            marker_not_found: self.marker_not_found.load(Ordering::Relaxed),
            malformed_energy: self.malformed_energy.load(Ordering::Relaxed),
            other_failures: self.other_failures.load(Ordering::Relaxed),
        }
    }
}

/// Turns a flat coordinate vector into a single-point energy by running an external
/// quantum-chemistry program.
///
/// Each evaluation works in its own scratch directory under `scratch_dir`, removed
/// when the evaluation ends, so evaluations never see each other's files and may run
/// concurrently.
pub struct EnergyCalculator<R: ProgramRunner> {
    cluster: Cluster,
    program: ProgramConfig,
    scratch_dir: PathBuf,
    runner: R,
    stats: EvaluationStats,
}

impl<R: ProgramRunner> EnergyCalculator<R> {
    pub fn new(
        cluster: Cluster,
        program: ProgramConfig,
        scratch_dir: impl Into<PathBuf>,
        runner: R,
    ) -> Self {
        Self {
            cluster,
            program,
            scratch_dir: scratch_dir.into(),
            runner,
            stats: EvaluationStats::default(),
        }
    }

    /// Resolves the configured executable without running anything.
    pub fn locate_executable(&self) -> Result<PathBuf, EvaluationError> {
        let name = self.program.executable_name();
        self.runner
            .locate(&name)
            .ok_or(EvaluationError::ExecutableNotFound { name })
    }

    /// Computes the energy of one geometry, reporting exactly why it failed if it did.
    pub fn evaluate(&self, coords: &[f64]) -> Result<f64, EvaluationError> {
        let positions = self.cluster.positions(coords)?;
        let executable = self.locate_executable()?;

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.scratch_dir)?;
        let software = self.program.software;
        let input_path = scratch.path().join(software.input_file_name());
        let log_path = scratch.path().join(software.output_file_name());

        let job = Job {
            cluster: &self.cluster,
            positions: &positions,
            settings: &self.program.settings,
        };
        software.write_input_to_path(&job, &input_path)?;
        trace!(input = %input_path.display(), "Input deck written.");

        let status = self
            .runner
            .run(&executable, &input_path, &log_path, scratch.path())?;
        if !status.success() {
            return Err(EvaluationError::NonZeroExit { code: status.code });
        }

        let content = parser::read_log(&log_path)?;
        let energy = parser::parse_energy(&content, software.energy_marker())?;
        Ok(energy)
    }

    /// The optimizer-facing objective: the energy on success, [`FAILURE_PENALTY`] otherwise.
    pub fn fitness(&self, coords: &[f64]) -> f64 {
        let outcome = self.evaluate(coords);
        self.stats.record(&outcome);
        match outcome {
            Ok(energy) => {
                debug!(energy, "Energy evaluation succeeded.");
                energy
            }
            Err(err) => {
                warn!(error = %err, "Energy evaluation failed; scoring the geometry with the failure penalty.");
                FAILURE_PENALTY
            }
        }
    }

    pub fn summary(&self) -> EvaluationSummary {
        self.stats.snapshot()
    }
}
