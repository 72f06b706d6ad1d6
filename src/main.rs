mod commands;

use clap::{Parser, Subcommand};
use commands::{check, run};
use std::error::Error;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "rjsbind")]
#[command(author, version, about = "Bind and run function calls across hot-reloaded scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    async fn run(self) -> Result<(), Box<dyn Error>> {
        match self.command {
            Commands::Check(args) => check::run(args).await,
            Commands::Run(args) => run::run(args).await,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every call in a scripts folder
    Check(commands::check::CheckArgs),

    /// Fire an event, optionally reloading on script changes
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter (e.g. RJSBIND_LOG=debug)
    let filter = match EnvFilter::try_from_env("RJSBIND_LOG") {
        Ok(f) => f,
        Err(_) => EnvFilter::new("info"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}
