//! # Core Module
//!
//! Stateless building blocks: the cluster model, element data, structure file I/O, and
//! the interfaces to the external quantum-chemistry programs.
//!
//! ## Architecture
//!
//! - **Cluster Representation** ([`models`]) - The atom set with its charge and multiplicity
//! - **File I/O** ([`io`]) - Multi-frame XYZ reading and writing for trajectories
//! - **External Programs** ([`programs`]) - Input deck writers, process runner, log parser
//! - **Utilities** ([`utils`]) - Atomic radii and coordinate/bounds helpers

pub mod io;
pub mod models;
pub mod programs;
pub mod utils;
