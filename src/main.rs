use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use metalwatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for metalwatch::AppCommand {
    fn from(cmd: Commands) -> metalwatch::AppCommand {
        match cmd {
            Commands::Fetch { json } => metalwatch::AppCommand::Fetch { json },
            Commands::Watch => metalwatch::AppCommand::Watch,
            Commands::Health => metalwatch::AppCommand::Health,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh once and print current prices
    Fetch {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep refreshing and print prices after every update
    Watch,
    /// Refresh once and print the liveness probe as JSON
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => metalwatch::cli::setup::setup(),
        Some(cmd) => metalwatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
