use crate::core::io::traits::StructureFile;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct XyzFrame {
    pub comment: String,
    pub symbols: Vec<String>,
    pub positions: Vec<Point3<f64>>,
}

impl XyzFrame {
    pub fn new(comment: impl Into<String>, symbols: Vec<String>, positions: Vec<Point3<f64>>) -> Self {
        Self {
            comment: comment.into(),
            symbols,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Frame has {symbols} symbols but {positions} positions")]
    Inconsistent { symbols: usize, positions: usize },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Frame ended early, expected {expected} atom lines")]
    TruncatedFrame { expected: usize },
    #[error("Atom line needs a symbol and three coordinates")]
    MissingField,
    #[error("Invalid coordinate value '{0}'")]
    InvalidFloat(String),
}

/// Formats one XYZ atom line: symbol padded to two characters, then three
/// coordinates 12 characters wide with 8 decimals.
pub fn format_atom_line(symbol: &str, position: &Point3<f64>) -> String {
    format!(
        "{:<2} {:12.8} {:12.8} {:12.8}",
        symbol, position.x, position.y, position.z
    )
}

pub struct XyzFile;

impl StructureFile for XyzFile {
    type Frame = XyzFrame;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Self::Frame>, Self::Error> {
        let mut frames = Vec::new();
        let mut lines = reader.lines().enumerate();

        while let Some((idx, line)) = lines.next() {
            let line = line?;
            let count_str = line.trim();
            if count_str.is_empty() {
                continue;
            }
            let count: usize = count_str.parse().map_err(|_| XyzError::Parse {
                line: idx + 1,
                kind: XyzParseErrorKind::InvalidAtomCount(count_str.to_string()),
            })?;

            let truncated = || XyzError::Parse {
                line: idx + 1,
                kind: XyzParseErrorKind::TruncatedFrame { expected: count },
            };

            let comment = match lines.next() {
                Some((_, comment)) => comment?,
                None => return Err(truncated()),
            };

            let mut symbols = Vec::with_capacity(count);
            let mut positions = Vec::with_capacity(count);
            for _ in 0..count {
                let (atom_idx, atom_line) = lines.next().ok_or_else(truncated)?;
                let atom_line = atom_line?;
                let (symbol, position) = parse_atom_line(&atom_line, atom_idx + 1)?;
                symbols.push(symbol);
                positions.push(position);
            }

            frames.push(XyzFrame {
                comment,
                symbols,
                positions,
            });
        }

        Ok(frames)
    }

    fn write_to(frame: &Self::Frame, writer: &mut impl Write) -> Result<(), Self::Error> {
        if frame.symbols.len() != frame.positions.len() {
            return Err(XyzError::Inconsistent {
                symbols: frame.symbols.len(),
                positions: frame.positions.len(),
            });
        }
        writeln!(writer, "{}", frame.positions.len())?;
        writeln!(writer, "{}", frame.comment)?;
        for (symbol, position) in frame.symbols.iter().zip(&frame.positions) {
            writeln!(writer, "{}", format_atom_line(symbol, position))?;
        }
        Ok(())
    }
}

fn parse_atom_line(line: &str, line_num: usize) -> Result<(String, Point3<f64>), XyzError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(XyzError::Parse {
            line: line_num,
            kind: XyzParseErrorKind::MissingField,
        });
    }
    let mut coords = [0.0; 3];
    for (slot, value) in coords.iter_mut().zip(&parts[1..4]) {
        *slot = value.parse().map_err(|_| XyzError::Parse {
            line: line_num,
            kind: XyzParseErrorKind::InvalidFloat(value.to_string()),
        })?;
    }
    Ok((
        parts[0].to_string(),
        Point3::new(coords[0], coords[1], coords[2]),
    ))
}
