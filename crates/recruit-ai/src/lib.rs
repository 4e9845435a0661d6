//! Decision core of the recruiting loop: explainable FitScores, pipeline health driven
//! sourcing, and conflict-free interview scheduling.

pub mod config;
pub mod error;
pub mod infra;
pub mod telemetry;
pub mod workflows;
