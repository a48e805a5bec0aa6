use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use xrate::cli::setup::setup;
use xrate::core::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount into one or more target assets
    Convert {
        /// Amount of the source asset
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        /// Source asset symbol, e.g. USD or BTC
        from: String,
        /// Target asset symbols
        #[arg(required = true)]
        to: Vec<String>,
    },
    /// List configured providers in failover order
    Providers,
    /// List supported assets
    Assets,
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => xrate::AppCommand::Convert { amount, from, to },
            Commands::Providers => xrate::AppCommand::Providers,
            Commands::Assets => xrate::AppCommand::Assets,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => xrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
