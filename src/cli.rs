//! Command-line interface definitions.

use clap::{Parser, Subcommand};

use crate::platform::Os;

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Manifest-driven cross-platform workstation provisioning engine",
    version
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across subcommands
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to the task manifest
    #[arg(short, long, global = true, default_value = "manifest.toml")]
    pub manifest: std::path::PathBuf,

    /// Preview the run without executing any command
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Directory for resolving relative script paths (defaults to the
    /// manifest's parent directory)
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Override the detected operating system (windows, mac, linux)
    #[arg(long, global = true)]
    pub os: Option<Os>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install packages and run setup scripts from the manifest
    Install(InstallOpts),
    /// Print the dependency graph and topological order, then exit
    Graph,
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Write a JSON report of per-task results to this path
    #[arg(long)]
    pub report: Option<std::path::PathBuf>,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_default_manifest() {
        let cli = Cli::parse_from(["provision", "install"]);
        assert!(matches!(cli.command, Command::Install(_)));
        assert_eq!(cli.global.manifest, std::path::PathBuf::from("manifest.toml"));
    }

    #[test]
    fn parse_install_with_manifest() {
        let cli = Cli::parse_from(["provision", "--manifest", "setup/tasks.toml", "install"]);
        assert_eq!(
            cli.global.manifest,
            std::path::PathBuf::from("setup/tasks.toml")
        );
    }

    #[test]
    fn parse_install_dry_run() {
        let cli = Cli::parse_from(["provision", "--dry-run", "install"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_install_dry_run_short() {
        let cli = Cli::parse_from(["provision", "-d", "install"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_os_override() {
        let cli = Cli::parse_from(["provision", "--os", "mac", "install"]);
        assert_eq!(cli.global.os, Some(Os::Mac));
    }

    #[test]
    fn parse_invalid_os_is_rejected() {
        let result = Cli::try_parse_from(["provision", "--os", "solaris", "install"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["provision", "--root", "/tmp/setup", "install"]);
        assert_eq!(cli.global.root, Some(std::path::PathBuf::from("/tmp/setup")));
    }

    #[test]
    fn parse_install_report_path() {
        let cli = Cli::parse_from(["provision", "install", "--report", "out.json"]);
        if let Command::Install(opts) = cli.command {
            assert_eq!(opts.report, Some(std::path::PathBuf::from("out.json")));
        } else {
            panic!("expected install command");
        }
    }

    #[test]
    fn parse_graph() {
        let cli = Cli::parse_from(["provision", "graph"]);
        assert!(matches!(cli.command, Command::Graph));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["provision", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["provision", "-v", "install"]);
        assert!(cli.verbose);
    }
}
