//! Maintenance commands for the tourist destination manager.
//!
//! Every command is an independent subcommand of `tdm-manage`. Setup
//! failures return an error (non-zero exit); per-item failures are logged,
//! counted and reported without stopping the run.

pub mod cli;
pub mod commands;
pub mod context;
