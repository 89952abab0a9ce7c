use std::path::PathBuf;

use branch_keeper_cli::commands::{execute, Operation};
use branch_keeper_cli::config::{AppConfig, DEFAULT_CONFIG_FILENAME};
use branch_keeper_cli::errors::Error;
use branch_keeper_core::Connector;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// branch-keeper: converge GitLab protected branches to a declared policy
#[derive(Parser)]
#[command(name = "branch-keeper")]
#[command(about = "Converge GitLab protected branches to a declared policy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILENAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the protected branch exists and matches
    Observe(ResourceArgs),

    /// Create or update the protected branch until it matches
    Apply(ResourceArgs),

    /// Remove the branch protection
    Delete(ResourceArgs),
}

#[derive(Args)]
struct ResourceArgs {
    /// Path to the protected branch JSON document
    resource: PathBuf,

    /// Write late-initialized fields and conditions back to the document
    #[arg(long)]
    write: bool,
}

async fn run(cli: &Cli) -> Result<String, Error> {
    let (operation, args) = match &cli.command {
        Commands::Observe(args) => (Operation::Observe, args),
        Commands::Apply(args) => (Operation::Apply, args),
        Commands::Delete(args) => (Operation::Delete, args),
    };

    let config = AppConfig::load(&cli.config)?;

    let report = execute(
        operation,
        &config.references,
        |provider| Ok(Connector::new(config.client_configs_for(provider)?)),
        &args.resource,
        args.write,
    )
    .await?;
    Ok(report.to_string())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("BRANCH_KEEPER_LOG"))
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(summary) => {
            println!("{summary}");
        }
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
