use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;
mod utils;

use cli::{CliArgs, Command};
use commands::{CommandExecutor, default_cache_dir};
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging; stdout is reserved for bundle output
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let loader_config = args.loader_config();
    let cache_dir = args.cache_dir.unwrap_or_else(default_cache_dir);
    let executor = CommandExecutor::new(cache_dir, &loader_config)?;

    match args.command {
        Command::Fetch { url, output } => {
            executor.fetch(&url, output.as_deref()).await?;
        }
        Command::Inspect { url } => {
            println!("{}", executor.inspect(&url).await);
        }
        Command::Purge { url } => {
            executor.purge(&url).await?;
        }
    }

    Ok(())
}
