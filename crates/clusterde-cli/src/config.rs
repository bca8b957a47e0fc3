pub mod defaults;
pub mod models;

use crate::cli::OptimizeArgs;
use crate::error::{CliError, Result};
use clusterde::core::models::cluster::Cluster;
use clusterde::core::programs::Software;
use clusterde::engine::config as core_config;
use clusterde::engine::error::EngineError;
use defaults::DefaultsConfig;
use models::AppConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialProgramConfig {
    software: Option<Software>,
    keywords: Option<String>,
    #[serde(rename = "extra-keywords")]
    extra_keywords: Option<String>,
    nprocs: Option<usize>,
    executable: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSystemConfig {
    charge: Option<i32>,
    multiplicity: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOptimizerConfig {
    #[serde(rename = "max-iterations")]
    max_iterations: Option<usize>,
    #[serde(rename = "population-size")]
    population_size: Option<usize>,
    mutation: Option<(f64, f64)>,
    recombination: Option<f64>,
    tolerance: Option<f64>,
    #[serde(rename = "abs-tolerance")]
    abs_tolerance: Option<f64>,
    init: Option<String>,
    seed: Option<u64>,
    workers: Option<usize>,
    polish: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    trajectory: Option<PathBuf>,
    #[serde(rename = "final-structure")]
    final_structure: Option<PathBuf>,
    history: Option<PathBuf>,
    #[serde(rename = "scratch-dir")]
    scratch_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    program: Option<PartialProgramConfig>,
    system: Option<PartialSystemConfig>,
    optimizer: Option<PartialOptimizerConfig>,
    output: Option<PartialOutputConfig>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves every setting with the precedence: CLI flag, then `-S`, then file, then defaults.
    pub fn merge_with_cli(mut self, args: &OptimizeArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let program = self.program.take().unwrap_or_default();
        let system = self.system.take().unwrap_or_default();
        let optimizer = self.optimizer.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let software = args
            .software
            .map(Software::from)
            .or(program.software)
            .ok_or_else(|| required("program.software", "--software"))?;
        let keywords = args
            .keywords
            .clone()
            .or(program.keywords)
            .ok_or_else(|| required("program.keywords", "--keywords"))?;
        let charge = args
            .charge
            .or(system.charge)
            .ok_or_else(|| required("system.charge", "--charge"))?;
        let multiplicity = args
            .multiplicity
            .or(system.multiplicity)
            .ok_or_else(|| required("system.multiplicity", "--multiplicity"))?;

        let cluster = Cluster::new(&args.atoms, charge, multiplicity).map_err(EngineError::from)?;

        let (solver, file_polish) = Self::merge_solver(args, optimizer, &defaults)?;
        let polish = Self::merge_polish(args.no_polish, file_polish, &defaults);
        let output = core_config::OutputConfig {
            trajectory_path: args
                .trajectory
                .clone()
                .or(output.trajectory)
                .unwrap_or(defaults.output.trajectory_path),
            final_structure_path: args
                .final_structure
                .clone()
                .or(output.final_structure)
                .unwrap_or(defaults.output.final_structure_path),
            history_path: args
                .history
                .clone()
                .or(output.history)
                .or(defaults.output.history_path),
            scratch_dir: args
                .scratch_dir
                .clone()
                .or(output.scratch_dir)
                .unwrap_or(defaults.output.scratch_dir),
        };

        let core_config = core_config::OptimizationConfigBuilder::new()
            .software(software)
            .keywords(keywords)
            .extra_keywords(args.extra_keywords.clone().or(program.extra_keywords))
            .nprocs(args.nprocs.or(program.nprocs))
            .executable(args.executable.clone().or(program.executable))
            .solver_config(solver)
            .polish_config(polish)
            .output_config(output)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            cluster,
            core_config,
        })
    }

    fn merge_solver(
        args: &OptimizeArgs,
        partial: PartialOptimizerConfig,
        defaults: &DefaultsConfig,
    ) -> Result<(core_config::SolverConfig, Option<bool>)> {
        let base = &defaults.solver;
        let init = match partial.init {
            Some(name) => name
                .parse::<core_config::InitStrategy>()
                .map_err(CliError::Config)?,
            None => base.init,
        };
        let solver = core_config::SolverConfig {
            max_iterations: args
                .n_iterations
                .or(partial.max_iterations)
                .unwrap_or(base.max_iterations),
            population_size: args
                .population_size
                .or(partial.population_size)
                .unwrap_or(base.population_size),
            mutation: partial.mutation.unwrap_or(base.mutation),
            recombination: partial.recombination.unwrap_or(base.recombination),
            tolerance: partial.tolerance.unwrap_or(base.tolerance),
            abs_tolerance: partial.abs_tolerance.unwrap_or(base.abs_tolerance),
            init,
            seed: args.seed.or(partial.seed).or(base.seed),
            workers: args.workers.or(partial.workers).unwrap_or(base.workers),
        };
        Ok((solver, partial.polish))
    }

    fn merge_polish(
        cli_no_polish: bool,
        file_val: Option<bool>,
        defaults: &DefaultsConfig,
    ) -> Option<core_config::PolishConfig> {
        let enabled = !cli_no_polish && file_val.unwrap_or(defaults.polish_enabled);
        enabled.then(|| defaults.polish.clone())
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "program.software" => {
                    self.program.get_or_insert_with(Default::default).software =
                        Some(value_str.parse().map_err(CliError::Config)?);
                }
                "program.keywords" => {
                    self.program.get_or_insert_with(Default::default).keywords = Some(value_str.to_string());
                }
                "program.extra-keywords" => {
                    self.program.get_or_insert_with(Default::default).extra_keywords =
                        Some(value_str.to_string());
                }
                "program.nprocs" => {
                    self.program.get_or_insert_with(Default::default).nprocs =
                        Some(parse_value(key, value_str)?);
                }
                "program.executable" => {
                    self.program.get_or_insert_with(Default::default).executable =
                        Some(PathBuf::from(value_str));
                }
                "system.charge" => {
                    self.system.get_or_insert_with(Default::default).charge =
                        Some(parse_value(key, value_str)?);
                }
                "system.multiplicity" => {
                    self.system.get_or_insert_with(Default::default).multiplicity =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.max-iterations" => {
                    self.optimizer.get_or_insert_with(Default::default).max_iterations =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.population-size" => {
                    self.optimizer.get_or_insert_with(Default::default).population_size =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.mutation" => {
                    let (lo, hi) = value_str.split_once(',').ok_or_else(|| {
                        CliError::Config(format!(
                            "Invalid value for {}: {}. Expected LOW,HIGH.",
                            key, value_str
                        ))
                    })?;
                    self.optimizer.get_or_insert_with(Default::default).mutation =
                        Some((parse_value(key, lo.trim())?, parse_value(key, hi.trim())?));
                }
                "optimizer.recombination" => {
                    self.optimizer.get_or_insert_with(Default::default).recombination =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.tolerance" => {
                    self.optimizer.get_or_insert_with(Default::default).tolerance =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.abs-tolerance" => {
                    self.optimizer.get_or_insert_with(Default::default).abs_tolerance =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.init" => {
                    self.optimizer.get_or_insert_with(Default::default).init =
                        Some(value_str.to_string());
                }
                "optimizer.seed" => {
                    self.optimizer.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.workers" => {
                    self.optimizer.get_or_insert_with(Default::default).workers =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.polish" => {
                    self.optimizer.get_or_insert_with(Default::default).polish =
                        Some(parse_value(key, value_str)?);
                }
                "output.trajectory" => {
                    self.output.get_or_insert_with(Default::default).trajectory =
                        Some(PathBuf::from(value_str));
                }
                "output.final-structure" => {
                    self.output.get_or_insert_with(Default::default).final_structure =
                        Some(PathBuf::from(value_str));
                }
                "output.history" => {
                    self.output.get_or_insert_with(Default::default).history =
                        Some(PathBuf::from(value_str));
                }
                "output.scratch-dir" => {
                    self.output.get_or_insert_with(Default::default).scratch_dir =
                        Some(PathBuf::from(value_str));
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn required(file_key: &str, flag: &str) -> CliError {
    CliError::Config(format!(
        "A value for '{}' is required either in the config file or via the {} argument.",
        file_key, flag
    ))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: {} (expected {})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}
