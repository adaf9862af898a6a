//! srcdeps CLI entry point
//!
//! Dispatches to subcommands.

use clap::Parser;
use console::style;
use srcdeps::cli::{Cli, Commands};
use srcdeps::config::ConfigManager;
use srcdeps::error::SrcdepsResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SrcdepsResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("srcdeps=warn"),
        1 => EnvFilter::new("srcdeps=info"),
        _ => EnvFilter::new("srcdeps=debug"),
    };
    let json_logs = matches!(&config, Ok(c) if c.general.log_format == "json");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json_logs {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    let config = config?;

    match cli.command {
        Commands::Parse(args) => srcdeps::cli::commands::parse(args).await,
        Commands::Id(args) => srcdeps::cli::commands::id(args, &config).await,
        Commands::Build(args) => srcdeps::cli::commands::build(args, &config).await,
        Commands::Cache(args) => srcdeps::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            srcdeps::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
