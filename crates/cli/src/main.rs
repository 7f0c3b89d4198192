//! Parlor CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Create config, model and training data directories
//! - `chat`: Interactive chat or single-message mode
//! - `train`: Compile the k-NN program from training data
//! - `status`: Show configuration and program status
//! - `check`: Run the content filter on a piece of text

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "parlor",
    about = "Parlor — few-shot creator chat agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directories
    Onboard,

    /// Chat as the creator persona
    Chat {
        /// Send a single fan message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Compile (or recompile) the k-NN program
    Train {
        /// Training data file; defaults to `knn.training_data`
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Show configuration and program status
    Status,

    /// Check text against the content filter
    Check {
        /// The text to check
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Train { data } => commands::train::run(data).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Check { text } => commands::check::run(&text).await?,
    }

    Ok(())
}
