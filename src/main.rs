//! Binary entry point for the `provision` CLI.

use anyhow::Result;
use clap::Parser;

use provision_cli::cli::{Cli, Command};
use provision_cli::commands;
use provision_cli::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command_name = match args.command {
        Command::Install(_) => "install",
        Command::Graph => "graph",
        Command::Version => "version",
    };
    init_subscriber(args.verbose, command_name);
    let log = Logger::new(command_name);

    match args.command {
        Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        Command::Graph => commands::graph::run(&args.global, &log),
        Command::Version => {
            let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("provision {version}");
            Ok(())
        }
    }
}
