//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use netapp::core::options::parse_key_value;

/// netapp - build .NET applications into container images
#[derive(Parser)]
#[command(name = "netapp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file applied on top of the global and project config
    #[arg(long, global = true, value_name = "FILE", env = "NETAPP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve project, configuration and assembly from local sources
    Resolve(ResolveArgs),

    /// Plan a build and print its stage graph and image config
    Plan(PlanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Local sources and build options shared by every build command.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Directory served as the build context
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub context: PathBuf,

    /// Directory holding the manifest (defaults to the context)
    #[arg(long, value_name = "DIR")]
    pub dockerfile: Option<PathBuf>,

    /// Manifest filename
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Project file, relative to the context
    #[arg(short, long)]
    pub project: Option<String>,

    /// Build configuration
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Entry assembly of the application
    #[arg(short, long)]
    pub assembly: Option<String>,

    /// Raw build option (repeatable)
    #[arg(long = "opt", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub opts: Vec<(String, String)>,

    /// Session identifier recorded in local sources
    #[arg(long, default_value = "local")]
    pub session: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Print the resolved parameters as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Config JSON of the runtime image
    #[arg(long, value_name = "FILE")]
    pub runtime_config: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
