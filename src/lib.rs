//! Manifest-driven workstation provisioning engine.
//!
//! Reads a declarative TOML manifest of tasks (packages to install, scripts
//! to run), filters them for the host operating system, validates the
//! dependency graph, and executes each task's commands in dependency order
//! with per-task status tracking and a final summary.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse and validate the task manifest
//! - **[`tasks`]**: dependency graph, command synthesis, and the execution engine
//! - **[`exec`]**: the subprocess seam the engine runs commands through
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `graph`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod tasks;
