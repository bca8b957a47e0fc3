use crate::core::utils::elements::{is_known_element, normalize_symbol};
use crate::core::utils::geometry::{self, Bounds, GeometryError};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("A cluster needs at least one atom")]
    Empty,
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Spin multiplicity must be at least 1 (got {0})")]
    InvalidMultiplicity(u32),
}

/// An atomic cluster: an ordered set of element symbols plus the fixed electronic state
/// (total charge and spin multiplicity) shared by every candidate geometry.
///
/// The position of a symbol in [`Cluster::symbols`] is significant: the `i`-th symbol
/// owns coordinates `3i..3i+3` of every flat coordinate vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    symbols: Vec<String>,
    charge: i32,
    multiplicity: u32,
}

impl Cluster {
    /// Creates a cluster, normalizing symbol capitalization and validating every element.
    pub fn new<S: AsRef<str>>(
        symbols: &[S],
        charge: i32,
        multiplicity: u32,
    ) -> Result<Self, ClusterError> {
        if symbols.is_empty() {
            return Err(ClusterError::Empty);
        }
        if multiplicity == 0 {
            return Err(ClusterError::InvalidMultiplicity(multiplicity));
        }
        let symbols = symbols
            .iter()
            .map(|s| {
                let symbol = normalize_symbol(s.as_ref());
                if is_known_element(&symbol) {
                    Ok(symbol)
                } else {
                    Err(ClusterError::UnknownElement(s.as_ref().to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            symbols,
            charge,
            multiplicity,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of free parameters seen by the optimizer (3 per atom).
    pub fn dimension(&self) -> usize {
        self.symbols.len() * 3
    }

    /// Concatenated symbols, e.g. `"CHHHH"` for methane.
    pub fn formula_label(&self) -> String {
        self.symbols.concat()
    }

    pub fn search_bounds(&self) -> Result<Bounds, GeometryError> {
        Bounds::from_atomic_radii(&self.symbols)
    }

    pub fn positions(&self, flat: &[f64]) -> Result<Vec<Point3<f64>>, GeometryError> {
        geometry::to_points_checked(flat, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_symbols() {
        let cluster = Cluster::new(&["c", "H", "cl"], 0, 1).unwrap();
        assert_eq!(cluster.symbols(), &["C", "H", "Cl"]);
        assert_eq!(cluster.formula_label(), "CHCl");
        assert_eq!(cluster.dimension(), 9);
    }

    #[test]
    fn new_rejects_empty_atom_set() {
        let symbols: [&str; 0] = [];
        assert_eq!(Cluster::new(&symbols, 0, 1), Err(ClusterError::Empty));
    }

    #[test]
    fn new_rejects_unknown_elements() {
        assert_eq!(
            Cluster::new(&["C", "Zz"], 0, 1),
            Err(ClusterError::UnknownElement("Zz".into()))
        );
    }

    #[test]
    fn new_rejects_zero_multiplicity() {
        assert_eq!(
            Cluster::new(&["H"], 0, 0),
            Err(ClusterError::InvalidMultiplicity(0))
        );
    }

    #[test]
    fn positions_pairs_coordinates_with_atoms() {
        let cluster = Cluster::new(&["H", "H"], 0, 1).unwrap();
        let positions = cluster.positions(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.74]).unwrap();
        assert_eq!(positions[1], Point3::new(0.0, 0.0, 0.74));
        assert!(cluster.positions(&[0.0; 9]).is_err());
    }
}
