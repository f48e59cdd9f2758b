//! Batch jobs preparing the sustainability and happiness datasets.
//!
//! Each job reads raw CSV sources, runs them through the transformation
//! stages and writes one cleaned artifact per output.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod summary;
pub mod types;
