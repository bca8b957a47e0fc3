//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::engine`] and [`crate::core`] layers
//! together into complete procedures.
//!
//! - **Cluster Optimization** ([`optimize`]) - Global search for the lowest-energy geometry
//!   of an atomic cluster, followed by optional polishing and recording of the result.

pub mod optimize;
