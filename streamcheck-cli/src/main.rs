// streamcheck-cli/src/main.rs
//
// Entry point for the `streamcheck` binary: parses arguments, initializes
// logging, dispatches to a command and maps its result to the exit code.

use clap::Parser;
use std::process;
use streamcheck_cli::commands::interrupt_token;
use streamcheck_cli::config::harness_config;
use streamcheck_cli::logging::init_logging;
use streamcheck_cli::output::print_error;
use streamcheck_cli::{Cli, CliResult, Commands, run_check, run_probe, run_publish};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = harness_config(&cli.global);
    log::debug!("Harness configuration: {:?}", config);
    let root = interrupt_token();

    match cli.command {
        Commands::Publish(args) => run_publish(&config, args, &root).await,
        Commands::Probe(args) => run_probe(&config, args, &root).await,
        Commands::Check(args) => run_check(&config, args, &root).await,
    }
}
