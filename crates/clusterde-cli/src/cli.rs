use clap::{Args, Parser, ValueEnum};
use clusterde::core::programs::Software;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "anoop",
    version,
    about = "ClusterDE - Global geometry optimization of atomic clusters with differential evolution, scored by ORCA or Gaussian single-point energies.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(flatten)]
    pub optimize: OptimizeArgs,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used when trial geometries are evaluated in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftwareArg {
    Orca,
    #[value(alias = "g16")]
    Gaussian,
}

impl From<SoftwareArg> for Software {
    fn from(arg: SoftwareArg) -> Self {
        match arg {
            SoftwareArg::Orca => Software::Orca,
            SoftwareArg::Gaussian => Software::Gaussian,
        }
    }
}

/// Arguments describing the cluster and how to optimize it.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    // --- Cluster ---
    /// Element symbols of the atoms in the cluster (e.g., C H H H H).
    #[arg(required = true, num_args = 1.., value_name = "ATOM")]
    pub atoms: Vec<String>,

    /// Total charge of the cluster.
    #[arg(short, long, allow_negative_numbers = true, value_name = "INT")]
    pub charge: Option<i32>,

    /// Spin multiplicity of the cluster.
    #[arg(short, long, value_name = "INT")]
    pub multiplicity: Option<u32>,

    // --- External Program ---
    /// Quantum-chemistry program used for single-point energies.
    #[arg(long, value_enum)]
    pub software: Option<SoftwareArg>,

    /// Keyword line written verbatim to the input (e.g., "! hf-3c" or "# b3lyp def2SVP").
    #[arg(long, value_name = "STR", allow_hyphen_values = true)]
    pub keywords: Option<String>,

    /// Extra line written to the input (e.g., "%scf maxiter 100 end" or "%mem=2GB").
    #[arg(long, value_name = "STR", allow_hyphen_values = true)]
    pub extra_keywords: Option<String>,

    /// Number of processors the external program may use.
    #[arg(short = 'n', long, value_name = "INT")]
    pub nprocs: Option<usize>,

    /// Path to the program executable; by default it is looked up on PATH.
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    // --- Optimizer Overrides ---
    /// Maximum number of differential evolution generations.
    #[arg(long, value_name = "INT")]
    pub n_iterations: Option<usize>,

    /// Population size multiplier (members = value x 3 x atoms, at least 5).
    #[arg(long, value_name = "INT")]
    pub population_size: Option<usize>,

    /// Seed for a reproducible search.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Evaluate trial geometries concurrently; values above 1 defer population updates to the end of each generation.
    #[arg(long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Skip the local refinement of the best structure, overriding the config file.
    #[arg(long)]
    pub no_polish: bool,

    // --- Files ---
    /// Path to a configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory under which per-evaluation scratch directories are created.
    #[arg(long, value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Output path for the per-generation best-structure trajectory.
    #[arg(long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Output path for the final best structure.
    #[arg(long, value_name = "PATH")]
    pub final_structure: Option<PathBuf>,

    /// Also record a per-generation CSV history at this path.
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimizer.seed=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}
