// src/orchestrator/mod.rs

//! Named commands → ordered steps → execution.
//!
//! - [`graph`] holds the step ordering and resolves a [`Command`] into a
//!   plan.
//! - [`runner`] executes a plan against a shared pipeline.
//!
//! [`Command`]: crate::cli::Command

pub mod graph;
pub mod runner;

pub use graph::{Step, StepGraph};
pub use runner::{run_plan, run_plan_until, watch};
