use super::{InputFormat, Job, write_atom_block};
use std::io::{self, Write};

/// Gaussian input decks (`.gjf`) and logs (`.log`).
///
/// Link-0 commands (`%nosave`, `%nprocs`, and the optional extra line, typically
/// `%mem=...`) precede the route line. The title line is the concatenated element
/// symbols, the atom count and the word `cluster`.
pub struct Gaussian;

impl InputFormat for Gaussian {
    const INPUT_EXTENSION: &'static str = "gjf";
    const OUTPUT_EXTENSION: &'static str = "log";
    const ENERGY_MARKER: &'static str = "SCF Done";
    const DEFAULT_EXECUTABLE: &'static str = "g16";

    fn write_to(job: &Job, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "%nosave")?;
        if let Some(nprocs) = job.settings.processors() {
            writeln!(writer, "%nprocs={}", nprocs)?;
        }
        if let Some(extra) = job.settings.extra_line() {
            writeln!(writer, "{}", extra)?;
        }
        writeln!(writer, "{}", job.settings.keywords)?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} {} cluster",
            job.cluster.formula_label(),
            job.positions.len()
        )?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} {}",
            job.cluster.charge(),
            job.cluster.multiplicity()
        )?;
        write_atom_block(job, writer)?;
        writeln!(writer)?;
        Ok(())
    }
}
