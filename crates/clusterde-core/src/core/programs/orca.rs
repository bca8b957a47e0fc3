use super::{InputFormat, Job, write_atom_block};
use std::io::{self, Write};

/// ORCA input decks (`.inp`) and logs (`.out`).
///
/// ```text
/// ! hf-3c
/// %pal nprocs 4 end
/// %scf maxiter 100 end
/// * xyz 0 1
/// C     0.00000000    0.00000000    0.00000000
/// ...
/// *
/// ```
pub struct Orca;

impl InputFormat for Orca {
    const INPUT_EXTENSION: &'static str = "inp";
    const OUTPUT_EXTENSION: &'static str = "out";
    const ENERGY_MARKER: &'static str = "FINAL SINGLE POINT ENERGY";
    const DEFAULT_EXECUTABLE: &'static str = "orca";

    fn write_to(job: &Job, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "{}", job.settings.keywords)?;
        if let Some(nprocs) = job.settings.processors() {
            writeln!(writer, "%pal nprocs {} end", nprocs)?;
        }
        if let Some(extra) = job.settings.extra_line() {
            writeln!(writer, "{}", extra)?;
        }
        writeln!(
            writer,
            "* xyz {} {}",
            job.cluster.charge(),
            job.cluster.multiplicity()
        )?;
        write_atom_block(job, writer)?;
        writeln!(writer, "*")?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cluster::Cluster;
    use crate::core::programs::CalculationSettings;
    use nalgebra::Point3;

    fn render(settings: &CalculationSettings) -> String {
        let cluster = Cluster::new(&["O", "H", "H"], -1, 2).unwrap();
        let positions = vec![
            Point3::new(0.0, 0.0, 0.1173),
            Point3::new(0.0, 0.7572, -0.4692),
            Point3::new(0.0, -0.7572, -0.4692),
        ];
        let job = Job {
            cluster: &cluster,
            positions: &positions,
            settings,
        };
        let mut buffer = Vec::new();
        Orca::write_to(&job, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn minimal_deck_has_keywords_geometry_and_terminator() {
        let text = render(&CalculationSettings::new("! hf-3c"));
        let expected = "\
! hf-3c
* xyz -1 2
O     0.00000000    0.00000000    0.11730000
H     0.00000000    0.75720000   -0.46920000
H     0.00000000   -0.75720000   -0.46920000
*

";
        assert_eq!(text, expected);
    }

    #[test]
    fn optional_lines_follow_keyword_line_in_order() {
        let settings = CalculationSettings {
            keywords: "! RI PBE def2-SVP D3BJ".into(),
            extra_keywords: Some("%scf maxiter 100 end".into()),
            nprocs: Some(4),
        };
        let text = render(&settings);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "! RI PBE def2-SVP D3BJ");
        assert_eq!(lines[1], "%pal nprocs 4 end");
        assert_eq!(lines[2], "%scf maxiter 100 end");
        assert_eq!(lines[3], "* xyz -1 2");
    }

    #[test]
    fn output_is_deterministic() {
        let settings = CalculationSettings {
            keywords: "! hf-3c".into(),
            extra_keywords: None,
            nprocs: Some(2),
        };
        assert_eq!(render(&settings), render(&settings));
    }
}
