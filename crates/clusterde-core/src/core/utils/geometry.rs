use super::elements::{atomic_radius_pm, normalize_symbol};
use nalgebra::Point3;
use thiserror::Error;

/// Divisor converting a sum of radii in picometers into the search box edge in Angstroms.
pub const RADIUS_SUM_DIVISOR: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Coordinate vector of length {len} cannot be split into (x, y, z) triples")]
    NotTriples { len: usize },
    #[error("Coordinate vector describes {found} atoms, expected {expected}")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error("No atomic radius is tabulated for element '{0}'")]
    UnknownElement(String),
    #[error("Cannot derive search bounds for an empty atom set")]
    EmptyAtomSet,
}

/// Reshapes a flat `[x0, y0, z0, x1, ...]` vector into one point per atom.
pub fn to_points(flat: &[f64]) -> Result<Vec<Point3<f64>>, GeometryError> {
    if flat.len() % 3 != 0 {
        return Err(GeometryError::NotTriples { len: flat.len() });
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

/// Like [`to_points`], but also checks the vector holds exactly `atom_count` atoms.
pub fn to_points_checked(
    flat: &[f64],
    atom_count: usize,
) -> Result<Vec<Point3<f64>>, GeometryError> {
    let points = to_points(flat)?;
    if points.len() != atom_count {
        return Err(GeometryError::AtomCountMismatch {
            expected: atom_count,
            found: points.len(),
        });
    }
    Ok(points)
}

/// Per-axis box constraints on a flat coordinate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Applies the same `[lower, upper]` interval to each of `dimension` axes.
    pub fn uniform(dimension: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; dimension],
            upper: vec![upper; dimension],
        }
    }

    /// Derives the symmetric cube `[-b/2, b/2]^(3N)` where `b` is the summed atomic
    /// radii of all atoms (pm) divided by [`RADIUS_SUM_DIVISOR`].
    pub fn from_atomic_radii<S: AsRef<str>>(symbols: &[S]) -> Result<Self, GeometryError> {
        if symbols.is_empty() {
            return Err(GeometryError::EmptyAtomSet);
        }
        let mut radius_sum = 0.0;
        for symbol in symbols {
            let symbol = symbol.as_ref();
            radius_sum += atomic_radius_pm(symbol)
                .ok_or_else(|| GeometryError::UnknownElement(normalize_symbol(symbol)))?;
        }
        let edge = radius_sum / RADIUS_SUM_DIVISOR;
        Ok(Self::uniform(symbols.len() * 3, -edge / 2.0, edge / 2.0))
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn width(&self, axis: usize) -> f64 {
        self.upper[axis] - self.lower[axis]
    }

    pub fn clamp(&self, axis: usize, value: f64) -> f64 {
        value.clamp(self.lower[axis], self.upper[axis])
    }

    /// Maps a unit-cube coordinate onto this box.
    pub fn scale(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .enumerate()
            .map(|(i, &u)| self.lower[i] + u * self.width(i))
            .collect()
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .enumerate()
                .all(|(i, &v)| v >= self.lower[i] && v <= self.upper[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_points_groups_coordinates_in_triples() {
        let points = to_points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn to_points_rejects_partial_triples() {
        let result = to_points(&[0.0, 1.0]);
        assert_eq!(result, Err(GeometryError::NotTriples { len: 2 }));
    }

    #[test]
    fn to_points_checked_rejects_wrong_atom_count() {
        let result = to_points_checked(&[0.0; 6], 3);
        assert_eq!(
            result,
            Err(GeometryError::AtomCountMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn bounds_from_radii_for_methane() {
        let bounds = Bounds::from_atomic_radii(&["C", "H", "H", "H", "H"]).unwrap();
        // (70 + 4 * 25) / 100 = 1.7 Angstrom edge
        assert_eq!(bounds.dimension(), 15);
        for axis in 0..15 {
            assert!((bounds.lower()[axis] + 0.85).abs() < 1e-12);
            assert!((bounds.upper()[axis] - 0.85).abs() < 1e-12);
        }
    }

    #[test]
    fn bounds_from_radii_rejects_unknown_element() {
        let result = Bounds::from_atomic_radii(&["C", "Qq"]);
        assert_eq!(result, Err(GeometryError::UnknownElement("Qq".into())));
    }

    #[test]
    fn bounds_from_radii_rejects_empty_set() {
        let symbols: [&str; 0] = [];
        assert_eq!(
            Bounds::from_atomic_radii(&symbols),
            Err(GeometryError::EmptyAtomSet)
        );
    }

    #[test]
    fn scale_maps_unit_cube_onto_box() {
        let bounds = Bounds::uniform(2, -1.0, 3.0);
        assert_eq!(bounds.scale(&[0.0, 1.0]), vec![-1.0, 3.0]);
        assert_eq!(bounds.scale(&[0.5, 0.25]), vec![1.0, 0.0]);
    }

    #[test]
    fn contains_checks_every_axis() {
        let bounds = Bounds::uniform(2, -1.0, 1.0);
        assert!(bounds.contains(&[0.0, 1.0]));
        assert!(!bounds.contains(&[0.0, 1.5]));
        assert!(!bounds.contains(&[0.0]));
    }
}
