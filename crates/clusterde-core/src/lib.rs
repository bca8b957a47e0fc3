//! # ClusterDE Core Library
//!
//! Global geometry optimization of small atomic clusters. Candidate geometries are
//! searched with differential evolution, and each one is scored with a single-point
//! energy from an external quantum-chemistry program (ORCA or Gaussian).
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data: the cluster model, element radii,
//!   XYZ trajectory I/O, and the input writers, runner, and log parser for each program.
//!
//! - **[`engine`]: The Logic Core.** The energy objective with its failure penalty, the
//!   differential evolution solver, bounded polishing, configuration, and progress events.
//!
//! - **[`workflows`]: The Public API.** [`workflows::optimize::run`] drives a full search
//!   from a cluster and a configuration to the recorded best structure.

pub mod core;
pub mod engine;
pub mod workflows;
