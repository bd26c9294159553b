//! Top-level subcommand orchestration.

pub mod graph;
pub mod install;
