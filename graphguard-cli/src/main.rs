//! graphguard CLI - command-line interface for the policy-driven SPARQL
//! query rewriter.

use clap::Parser;

use graphguard_cli::cli::{Cli, Command};
use graphguard_cli::commands;
use graphguard_cli::error::CliResult;
use graphguard_cli::output;

#[tokio::main]
async fn main() {
    graphguard_core::logging::init();

    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Run the appropriate command
    match cli.command {
        Command::Rewrite(args) => commands::rewrite::run(args).await,
        Command::CheckPolicy(args) => commands::check_policy::run(args).await,
        Command::Explain(args) => commands::explain::run(args).await,
        Command::Version => commands::version::run().await,
    }
}
