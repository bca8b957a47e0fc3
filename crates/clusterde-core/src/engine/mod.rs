//! # Engine Module
//!
//! The stateful optimization machinery: turning coordinates into energies through an
//! external program, and searching the coordinate box for the lowest one.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Program, solver, polish, and output settings with a validating builder
//! - **Objective** ([`objective`]) - Energy evaluation in per-call scratch directories, with the failure penalty
//! - **Global Search** ([`solver`]) - `best1bin` differential evolution with immediate or deferred updating
//! - **Local Refinement** ([`polish`]) - Bounded steepest descent applied to the global optimum
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod config;
pub mod error;
pub mod objective;
pub mod polish;
pub mod progress;
pub mod solver;
