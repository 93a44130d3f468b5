//! Deskhand CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a starter config file
//! - `ask`     — Interactive chat or single-question mode
//! - `serve`   — JSON-lines worker over stdin/stdout
//! - `status`  — Show configuration and agent corpora

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskhand",
    about = "Deskhand — multi-domain retrieval-augmented chat responder",
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
    /// Write a starter configuration file
    Onboard,

    /// Ask the responder a question
    Ask {
        /// Send a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,

        /// Username attached to the conversation turns
        #[arg(short, long, default_value = "User")]
        username: String,
    },

    /// Process JSON-lines requests from stdin, answers to stdout
    Serve,

    /// Show configuration and agent corpora
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; `serve` owns stdout for its JSON lines.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { question, username } => commands::ask::run(question, username).await?,
        Commands::Serve => commands::serve::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
