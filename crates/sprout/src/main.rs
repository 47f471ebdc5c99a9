//! Sprout CLI - Command-line client for the Sprout analysis service.
//!
//! Submits asynchronous analyses, watches them to completion, and fetches
//! daily tips, using the same data-access layer embedded UIs use.
//!
//! # Usage
//!
//! ```bash
//! # Save a bearer token
//! sprout login --token <token>
//!
//! # Run a feeding analysis over February and wait for the result
//! sprout analyze --baby 7 --type feeding --from 2024-02-01 --to 2024-02-29
//!
//! # Today's tips
//! sprout tips --baby 7
//!
//! # Stats, latest analyses, and attention items
//! sprout overview --baby 7
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod platform;

/// Sprout - Command-line client for the Sprout analysis service.
#[derive(Parser, Debug)]
#[command(name = "sprout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Save the bearer token used for authenticated requests
    Login(cli::login::LoginArgs),

    /// Submit an analysis job and watch it to completion
    Analyze(cli::analyze::AnalyzeArgs),

    /// Fetch (or regenerate) daily tips
    Tips(cli::tips::TipsArgs),

    /// Show stats, latest analyses, and attention items for a baby
    Overview(cli::overview::OverviewArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match sprout_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sprout config path`."
            );
            sprout_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Sprout CLI v{}", sprout_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Login(args) => cli::login::execute(args).await,
        Commands::Analyze(args) => cli::analyze::execute(args).await,
        Commands::Tips(args) => cli::tips::execute(args).await,
        Commands::Overview(args) => cli::overview::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
