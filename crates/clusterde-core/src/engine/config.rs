use crate::core::programs::{CalculationSettings, Software};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How the initial population is spread over the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitStrategy {
    /// One stratified sample per member along every axis.
    #[default]
    LatinHypercube,
    /// Independent uniform samples.
    Random,
}

impl FromStr for InitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "latin-hypercube" | "latinhypercube" => Ok(InitStrategy::LatinHypercube),
            "random" => Ok(InitStrategy::Random),
            other => Err(format!(
                "Unknown init strategy '{}'. Expected 'latin-hypercube' or 'random'.",
                other
            )),
        }
    }
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStrategy::LatinHypercube => write!(f, "latin-hypercube"),
            InitStrategy::Random => write!(f, "random"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramConfig {
    pub software: Software,
    pub settings: CalculationSettings,
    /// Explicit executable; when `None` the program's default name is looked up on `PATH`.
    pub executable: Option<PathBuf>,
}

impl ProgramConfig {
    /// The name or path handed to executable lookup.
    pub fn executable_name(&self) -> String {
        match &self.executable {
            Some(path) => path.to_string_lossy().into_owned(),
            None => self.software.default_executable().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum number of generations.
    pub max_iterations: usize,
    /// Population size multiplier; the population holds `population_size * dimension` members.
    pub population_size: usize,
    /// Range the differential weight is dithered over, once per generation.
    pub mutation: (f64, f64),
    /// Crossover probability.
    pub recombination: f64,
    /// Relative convergence tolerance on the spread of population energies.
    pub tolerance: f64,
    /// Absolute convergence tolerance on the spread of population energies.
    pub abs_tolerance: f64,
    pub init: InitStrategy,
    pub seed: Option<u64>,
    /// Number of trial evaluations run concurrently. `1` evaluates serially and
    /// updates the population immediately; more defers updates to the end of a generation.
    pub workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            population_size: 15,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            tolerance: 0.01,
            abs_tolerance: 1e-6,
            init: InitStrategy::LatinHypercube,
            seed: None,
            workers: 1,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name, reason: &str| {
            Err(ConfigError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        if self.max_iterations == 0 {
            return invalid("max_iterations", "must be at least 1");
        }
        if self.population_size == 0 {
            return invalid("population_size", "must be at least 1");
        }
        let (lo, hi) = self.mutation;
        if !(0.0..=2.0).contains(&lo) || !(0.0..=2.0).contains(&hi) || lo > hi {
            return invalid("mutation", "must be an ordered pair within [0, 2]");
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return invalid("recombination", "must lie within [0, 1]");
        }
        if self.tolerance < 0.0 || self.abs_tolerance < 0.0 {
            return invalid("tolerance", "tolerances must be non-negative");
        }
        if self.workers == 0 {
            return invalid("workers", "must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolishConfig {
    pub max_iterations: usize,
    /// Initial trial step along the descent direction, in Angstroms.
    pub step_size: f64,
    pub gradient_tolerance: f64,
    /// Forward-difference displacement, in Angstroms.
    pub finite_difference_step: f64,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            step_size: 0.1,
            gradient_tolerance: 1e-5,
            finite_difference_step: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub trajectory_path: PathBuf,
    pub final_structure_path: PathBuf,
    pub history_path: Option<PathBuf>,
    /// Directory under which a scratch directory is created for every energy evaluation.
    pub scratch_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            trajectory_path: PathBuf::from("best_trj.xyz"),
            final_structure_path: PathBuf::from("best.xyz"),
            history_path: None,
            scratch_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    pub program: ProgramConfig,
    pub solver: SolverConfig,
    /// `None` disables the local refinement of the final candidate.
    pub polish: Option<PolishConfig>,
    pub output: OutputConfig,
}

#[derive(Default)]
pub struct OptimizationConfigBuilder {
    software: Option<Software>,
    keywords: Option<String>,
    extra_keywords: Option<String>,
    nprocs: Option<usize>,
    executable: Option<PathBuf>,
    solver: Option<SolverConfig>,
    polish: Option<Option<PolishConfig>>,
    output: Option<OutputConfig>,
}

impl OptimizationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn software(mut self, software: Software) -> Self {
        self.software = Some(software);
        self
    }
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }
    pub fn extra_keywords(mut self, extra: Option<String>) -> Self {
        self.extra_keywords = extra;
        self
    }
    pub fn nprocs(mut self, nprocs: Option<usize>) -> Self {
        self.nprocs = nprocs;
        self
    }
    pub fn executable(mut self, path: Option<PathBuf>) -> Self {
        self.executable = path;
        self
    }
    pub fn solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = Some(solver);
        self
    }
    pub fn polish_config(mut self, polish: Option<PolishConfig>) -> Self {
        self.polish = Some(polish);
        self
    }
    pub fn output_config(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Result<OptimizationConfig, ConfigError> {
        let keywords = self
            .keywords
            .ok_or(ConfigError::MissingParameter("keywords"))?;
        if keywords.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "keywords",
                reason: "must not be empty".to_string(),
            });
        }
        let program = ProgramConfig {
            software: self
                .software
                .ok_or(ConfigError::MissingParameter("software"))?,
            settings: CalculationSettings {
                keywords,
                extra_keywords: self.extra_keywords,
                nprocs: self.nprocs,
            },
            executable: self.executable,
        };

        let solver = self.solver.unwrap_or_default();
        solver.validate()?;

        let polish = self
            .polish
            .unwrap_or_else(|| Some(PolishConfig::default()));

        Ok(OptimizationConfig {
            program,
            solver,
            polish,
            output: self.output.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_builder() -> OptimizationConfigBuilder {
        OptimizationConfigBuilder::new()
            .software(Software::Orca)
            .keywords("! hf-3c")
    }

    #[test]
    fn build_applies_defaults() {
        let config = minimal_builder().build().unwrap();
        assert_eq!(config.program.software, Software::Orca);
        assert_eq!(config.program.settings.keywords, "! hf-3c");
        assert_eq!(config.solver, SolverConfig::default());
        assert_eq!(config.polish, Some(PolishConfig::default()));
        assert_eq!(config.output.trajectory_path, PathBuf::from("best_trj.xyz"));
        assert_eq!(config.output.final_structure_path, PathBuf::from("best.xyz"));
    }

    #[test]
    fn build_requires_software_and_keywords() {
        let result = OptimizationConfigBuilder::new().keywords("! hf-3c").build();
        assert_eq!(result, Err(ConfigError::MissingParameter("software")));

        let result = OptimizationConfigBuilder::new()
            .software(Software::Gaussian)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("keywords")));
    }

    #[test]
    fn build_rejects_blank_keywords() {
        let result = OptimizationConfigBuilder::new()
            .software(Software::Gaussian)
            .keywords("   ")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "keywords", .. })
        ));
    }

    #[test]
    fn polish_can_be_disabled() {
        let config = minimal_builder().polish_config(None).build().unwrap();
        assert_eq!(config.polish, None);
    }

    #[test]
    fn solver_validation_rejects_out_of_range_values() {
        let bad = [
            SolverConfig {
                recombination: 1.5,
                ..Default::default()
            },
            SolverConfig {
                mutation: (1.0, 0.5),
                ..Default::default()
            },
            SolverConfig {
                workers: 0,
                ..Default::default()
            },
            SolverConfig {
                max_iterations: 0,
                ..Default::default()
            },
        ];
        for solver in bad {
            assert!(minimal_builder().solver_config(solver).build().is_err());
        }
    }

    #[test]
    fn executable_name_prefers_configured_path() {
        let mut config = minimal_builder().build().unwrap();
        assert_eq!(config.program.executable_name(), "orca");
        config.program.executable = Some(PathBuf::from("/opt/orca/orca"));
        assert_eq!(config.program.executable_name(), "/opt/orca/orca");
    }

    #[test]
    fn init_strategy_parses_common_spellings() {
        assert_eq!(
            "latin_hypercube".parse::<InitStrategy>(),
            Ok(InitStrategy::LatinHypercube)
        );
        assert_eq!("Random".parse::<InitStrategy>(), Ok(InitStrategy::Random));
        assert!("sobol".parse::<InitStrategy>().is_err());
    }
}
