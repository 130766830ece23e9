//! netapp CLI - plan .NET container builds from local directories

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use netapp::util::diagnostic::emit;
use netapp::BuildFailure;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        match e.downcast_ref::<BuildFailure>() {
            Some(failure) => emit(&failure.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("netapp=debug")
    } else {
        EnvFilter::new("netapp=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let config = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, config, color),
        Commands::Plan(args) => commands::plan::execute(args, config, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
