//! # Core Models Module
//!
//! Data structures describing the system being optimized.
//!
//! - [`cluster`] - The atom set together with its total charge and spin multiplicity
//!
//! Candidate geometries are not stored here: the optimizer works on flat coordinate
//! vectors, and [`cluster::Cluster::positions`] pairs such a vector with the atom set.

pub mod cluster;
