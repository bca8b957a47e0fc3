//! Provides input/output functionality for structure file formats.
//!
//! Optimizer trajectories and final structures are written as XYZ files through the
//! trait-based interface in [`traits`].

pub mod traits;
pub mod xyz;
