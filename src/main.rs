use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use ndnfw_core::ForwarderConfig;
use std::path::PathBuf;

mod commands;
mod utils;

/// NDN forwarder command line interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as JSON
    Config,

    /// Show the FIB entry a name resolves to
    Route {
        /// Name to look up (NDN URI format)
        name: String,
    },

    /// Show every configured FIB entry
    Routes,

    /// Run Interest/Data exchanges through an in-process forwarder
    Benchmark {
        /// Number of Interests to send
        #[clap(short = 'n', long, default_value = "1000")]
        count: usize,

        /// Name prefix to use for benchmark
        #[clap(short, long, default_value = "/benchmark")]
        prefix: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ForwarderConfig> {
    match path {
        Some(path) => ForwarderConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ForwarderConfig::from_env().context("Failed to read configuration from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" }
    )).init();

    let config = load_config(cli.config.as_ref())?;
    debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Config => {
            commands::config::show(&config)?;
        }
        Commands::Route { name } => {
            commands::route::resolve(&config, &name)?;
        }
        Commands::Routes => {
            commands::route::list(&config)?;
        }
        Commands::Benchmark { count, prefix } => {
            commands::benchmark::run_benchmark(&config, count, prefix).await?;
        }
    }

    Ok(())
}
