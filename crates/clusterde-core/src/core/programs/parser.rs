use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Score assigned to a geometry whose energy could not be obtained.
pub const FAILURE_PENALTY: f64 = 1e10;

/// Whitespace-delimited token of the marker line that holds the energy.
pub const ENERGY_FIELD_INDEX: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum EnergyParseError {
    #[error("No line containing '{marker}' was found")]
    MarkerNotFound { marker: String },
    #[error("Energy line has no parseable value in field {field}: '{line}'")]
    MalformedEnergy { line: String, field: usize },
}

/// Returns the energy from the *last* line of `content` containing `marker`.
///
/// Programs that restart internally print several energy lines; only the final one
/// is authoritative, so lines are scanned from the end of the log.
pub fn parse_energy(content: &str, marker: &str) -> Result<f64, EnergyParseError> {
    let line = content
        .lines()
        .rev()
        .find(|line| line.contains(marker))
        .ok_or_else(|| EnergyParseError::MarkerNotFound {
            marker: marker.to_string(),
        })?;

    line.split_whitespace()
        .nth(ENERGY_FIELD_INDEX)
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|energy| energy.is_finite())
        .ok_or_else(|| EnergyParseError::MalformedEnergy {
            line: line.trim().to_string(),
            field: ENERGY_FIELD_INDEX,
        })
}

pub fn read_log<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAUSSIAN_MARKER: &str = "SCF Done";
    const ORCA_MARKER: &str = "FINAL SINGLE POINT ENERGY";

    #[test]
    fn parses_gaussian_scf_line() {
        let log = " SCF Done:  E(RB3LYP) =  -40.5183942     A.U. after   10 cycles\n";
        assert_eq!(parse_energy(log, GAUSSIAN_MARKER), Ok(-40.5183942));
    }

    #[test]
    fn parses_orca_final_energy_line() {
        let log = "\
-------------------------   --------------------
FINAL SINGLE POINT ENERGY       -40.386473209817
-------------------------   --------------------
";
        assert_eq!(parse_energy(log, ORCA_MARKER), Ok(-40.386473209817));
    }

    #[test]
    fn last_marker_line_wins() {
        let log = "\
 SCF Done:  E(RHF) =  -39.9000000     A.U. after    8 cycles
 Restarting with a new guess
 SCF Done:  E(RHF) =  -40.2000000     A.U. after   12 cycles
 Normal termination
";
        assert_eq!(parse_energy(log, GAUSSIAN_MARKER), Ok(-40.2));
    }

    #[test]
    fn missing_marker_is_reported() {
        let log = "Error termination via Lnk1e\n";
        assert_eq!(
            parse_energy(log, GAUSSIAN_MARKER),
            Err(EnergyParseError::MarkerNotFound {
                marker: GAUSSIAN_MARKER.into()
            })
        );
    }

    #[test]
    fn non_finite_energy_is_malformed() {
        for token in ["NaN", "nan", "inf", "-inf", "infinity"] {
            let log = format!("FINAL SINGLE POINT ENERGY       {}\n", token);
            assert!(
                matches!(
                    parse_energy(&log, ORCA_MARKER),
                    Err(EnergyParseError::MalformedEnergy { field: 4, .. })
                ),
                "token {token} was accepted"
            );
        }
    }

    #[test]
    fn short_or_garbled_marker_line_is_malformed() {
        let result = parse_energy("FINAL SINGLE POINT ENERGY\n", ORCA_MARKER);
        assert!(matches!(
            result,
            Err(EnergyParseError::MalformedEnergy { field: 4, .. })
        ));

        let result = parse_energy("FINAL SINGLE POINT ENERGY  NaN?\n", ORCA_MARKER);
        assert!(matches!(result, Err(EnergyParseError::MalformedEnergy { .. })));
    }

    #[test]
    fn read_log_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molecule.log");
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b" SCF Done:  E(RHF) =  -1.5     A.U.\n");
        fs::write(&path, bytes).unwrap();

        let content = read_log(&path).unwrap();
        assert_eq!(parse_energy(&content, GAUSSIAN_MARKER), Ok(-1.5));
    }
}
