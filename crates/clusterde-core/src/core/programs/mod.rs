//! Interfaces to the external quantum-chemistry programs.
//!
//! Every supported program is described by an [`InputFormat`] implementation that knows
//! how to render an input deck, where the program writes its log, and which log line
//! carries the total energy. [`Software`] selects one of them at runtime.
//!
//! - [`orca`] / [`gaussian`] - Input deck writers
//! - [`runner`] - Locating and launching the program executable
//! - [`parser`] - Extracting the final energy from a program log

pub mod gaussian;
pub mod orca;
pub mod parser;
pub mod runner;

use crate::core::models::cluster::Cluster;
use nalgebra::Point3;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Base name shared by the input and log files of a calculation.
pub const JOB_NAME: &str = "molecule";

/// Program-level settings that stay fixed for every energy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalculationSettings {
    /// The route/keyword line, e.g. `"! hf-3c"` or `"# b3lyp def2SVP"`. Written verbatim.
    pub keywords: String,
    /// An optional extra line, e.g. `"%scf maxiter 100 end"` or `"%mem=2GB"`.
    pub extra_keywords: Option<String>,
    /// Number of processors the program may use.
    pub nprocs: Option<usize>,
}

impl CalculationSettings {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    pub(crate) fn extra_line(&self) -> Option<&str> {
        self.extra_keywords.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn processors(&self) -> Option<usize> {
        self.nprocs.filter(|&n| n > 0)
    }
}

/// Everything needed to render one input deck.
#[derive(Debug, Clone, Copy)]
pub struct Job<'a> {
    pub cluster: &'a Cluster,
    pub positions: &'a [Point3<f64>],
    pub settings: &'a CalculationSettings,
}

/// Formats one atom of an input deck: symbol padded to two characters, then three
/// coordinates 12 characters wide with 8 decimals, separated by two spaces.
pub fn format_input_atom_line(symbol: &str, position: &Point3<f64>) -> String {
    format!(
        "{:<2}  {:12.8}  {:12.8}  {:12.8}",
        symbol, position.x, position.y, position.z
    )
}

pub(crate) fn write_atom_block(job: &Job, writer: &mut impl Write) -> io::Result<()> {
    for (symbol, position) in job.cluster.symbols().iter().zip(job.positions) {
        writeln!(writer, "{}", format_input_atom_line(symbol, position))?;
    }
    Ok(())
}

/// Describes the file conventions of one external program.
pub trait InputFormat {
    /// Extension of the generated input deck.
    const INPUT_EXTENSION: &'static str;
    /// Extension of the log file the program's merged output is redirected to.
    const OUTPUT_EXTENSION: &'static str;
    /// Substring identifying the log line that carries the total energy.
    const ENERGY_MARKER: &'static str;
    /// Executable looked up on `PATH` when none is configured.
    const DEFAULT_EXECUTABLE: &'static str;

    /// Renders the input deck for `job`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(job: &Job, writer: &mut impl Write) -> io::Result<()>;

    fn write_to_path<P: AsRef<Path>>(job: &Job, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(job, &mut writer)?;
        writer.flush()
    }
}

/// The external programs that can score a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Software {
    Orca,
    Gaussian,
}

impl Software {
    pub fn write_input(&self, job: &Job, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Software::Orca => orca::Orca::write_to(job, writer),
            Software::Gaussian => gaussian::Gaussian::write_to(job, writer),
        }
    }

    pub fn write_input_to_path<P: AsRef<Path>>(&self, job: &Job, path: P) -> io::Result<()> {
        match self {
            Software::Orca => orca::Orca::write_to_path(job, path),
            Software::Gaussian => gaussian::Gaussian::write_to_path(job, path),
        }
    }

    pub fn input_extension(&self) -> &'static str {
        match self {
            Software::Orca => orca::Orca::INPUT_EXTENSION,
            Software::Gaussian => gaussian::Gaussian::INPUT_EXTENSION,
        }
    }

    pub fn output_extension(&self) -> &'static str {
        match self {
            Software::Orca => orca::Orca::OUTPUT_EXTENSION,
            Software::Gaussian => gaussian::Gaussian::OUTPUT_EXTENSION,
        }
    }

    pub fn energy_marker(&self) -> &'static str {
        match self {
            Software::Orca => orca::Orca::ENERGY_MARKER,
            Software::Gaussian => gaussian::Gaussian::ENERGY_MARKER,
        }
    }

    pub fn default_executable(&self) -> &'static str {
        match self {
            Software::Orca => orca::Orca::DEFAULT_EXECUTABLE,
            Software::Gaussian => gaussian::Gaussian::DEFAULT_EXECUTABLE,
        }
    }

    /// File name of the input deck, e.g. `molecule.inp`.
    pub fn input_file_name(&self) -> String {
        format!("{}.{}", JOB_NAME, self.input_extension())
    }

    /// File name of the program log, e.g. `molecule.out`.
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", JOB_NAME, self.output_extension())
    }
}

impl fmt::Display for Software {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Software::Orca => write!(f, "orca"),
            Software::Gaussian => write!(f, "gaussian"),
        }
    }
}

impl FromStr for Software {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orca" => Ok(Software::Orca),
            "gaussian" | "g16" => Ok(Software::Gaussian),
            other => Err(format!(
                "Unknown software '{}'. Expected 'orca' or 'gaussian'.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_atom_line_uses_two_space_separators() {
        let line = format_input_atom_line("C", &Point3::new(0.0, -1.25, 10.5));
        assert_eq!(line, "C     0.00000000   -1.25000000   10.50000000");
    }

    #[test]
    fn file_names_follow_program_conventions() {
        assert_eq!(Software::Orca.input_file_name(), "molecule.inp");
        assert_eq!(Software::Orca.output_file_name(), "molecule.out");
        assert_eq!(Software::Gaussian.input_file_name(), "molecule.gjf");
        assert_eq!(Software::Gaussian.output_file_name(), "molecule.log");
    }

    #[test]
    fn software_parses_case_insensitively() {
        assert_eq!("ORCA".parse::<Software>(), Ok(Software::Orca));
        assert_eq!("gaussian".parse::<Software>(), Ok(Software::Gaussian));
        assert!("nwchem".parse::<Software>().is_err());
    }

    #[test]
    fn empty_optional_settings_are_treated_as_absent() {
        let settings = CalculationSettings {
            keywords: "! hf-3c".into(),
            extra_keywords: Some(String::new()),
            nprocs: Some(0),
        };
        assert_eq!(settings.extra_line(), None);
        assert_eq!(settings.processors(), None);
    }
}
