use anyhow::Result;
use avanza_stock::AppCommand;
use avanza_stock::core::instrument::InstrumentType;
use avanza_stock::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

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

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Search {
                term,
                instrument_type,
            } => AppCommand::Search {
                term,
                instrument_type,
            },
            Commands::Add => AppCommand::Add,
            Commands::List => AppCommand::List,
            Commands::Options { entry } => AppCommand::Options { entry },
            Commands::Remove { entry } => AppCommand::Remove { entry },
            Commands::Show { entry } => AppCommand::Show { entry },
            Commands::Import { path } => AppCommand::Import { path },
            Commands::Resolve { from, to } => AppCommand::Resolve { from, to },
            Commands::Api => AppCommand::Api,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Search Avanza for instruments
    Search {
        term: String,
        /// One of stock, fund, index, bond, certificate, exchange_rate or all
        #[arg(short = 't', long = "type", default_value = "all")]
        instrument_type: InstrumentType,
    },
    /// Add an instrument with the setup wizard
    Add,
    /// List configured instruments
    List,
    /// Change the holding options of an instrument
    Options {
        /// Entry id or instrument id
        entry: String,
    },
    /// Remove a configured instrument
    Remove {
        /// Entry id or instrument id
        entry: String,
    },
    /// Display sensor values for configured instruments
    Show {
        /// Entry id or instrument id
        entry: Option<String>,
    },
    /// Import sensors from a legacy YAML configuration
    Import {
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Show the conversion instrument for a currency pair
    Resolve { from: String, to: Option<String> },
    /// Answer JSON search messages read from stdin, one per line
    Api,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => avanza_stock::cli::setup::setup(),
        Some(cmd) => avanza_stock::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
