pub mod api;
pub mod cli;
pub mod core;
pub mod flow;
pub mod legacy;
pub mod providers;
pub mod store;

use crate::cli::prompt::Prompt;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::instrument::InstrumentType;
use crate::providers::avanza::AvanzaProvider;
use crate::store::DiskEntryStore;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Search {
        term: String,
        instrument_type: InstrumentType,
    },
    Add,
    List,
    Options {
        entry: String,
    },
    Remove {
        entry: String,
    },
    Show {
        entry: Option<String>,
    },
    Import {
        path: Option<String>,
    },
    Resolve {
        from: String,
        to: Option<String>,
    },
    Api,
}

/// Runs `command` against the terminal.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let mut input = std::io::stdin().lock();
    let mut output = std::io::stdout();
    run_command_with_io(command, config_path, &mut input, &mut output).await
}

pub async fn run_command_with_io(
    command: AppCommand,
    config_path: Option<&str>,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    info!("avanza-stock starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // Resolving needs neither the network nor the store.
    if let AppCommand::Resolve { from, to } = &command {
        return cli::resolve::run(from, to.as_deref(), output);
    }

    let stock_cache = Arc::new(Cache::with_ttl(Duration::from_secs(config.cache_ttl_secs)));
    let provider = AvanzaProvider::new(config.avanza_base_url(), Arc::clone(&stock_cache));

    if let AppCommand::Search {
        term,
        instrument_type,
    } = &command
    {
        return cli::search::run(&provider, term, *instrument_type, output).await;
    }
    if command == AppCommand::Api {
        cli::api::run(&provider, input, output).await?;
        return Ok(());
    }

    let data_path = config.default_data_path()?;
    let store = DiskEntryStore::open(&data_path)
        .with_context(|| format!("Failed to open entry store at {}", data_path.display()))?;

    match command {
        AppCommand::Add => {
            let mut prompt = Prompt::new(input, output);
            cli::add::run(&provider, &store, &mut prompt).await?;
        }
        AppCommand::List => cli::entries::list(&store, output)?,
        AppCommand::Options { entry } => {
            let mut prompt = Prompt::new(input, output);
            cli::entries::options(&provider, &store, &entry, &mut prompt).await?;
        }
        AppCommand::Remove { entry } => cli::entries::remove(&store, &entry, output)?,
        AppCommand::Show { entry } => {
            cli::show::run(
                &store,
                &provider,
                &provider,
                &config.currency,
                entry.as_deref(),
                output,
            )
            .await?
        }
        AppCommand::Import { path } => {
            let path = path
                .or_else(|| config.legacy_config.clone())
                .map(PathBuf::from)
                .context("No legacy configuration given; pass --path or set legacy_config")?;
            cli::import::run(&provider, &store, &path, output).await?;
        }
        AppCommand::Search { .. } | AppCommand::Api | AppCommand::Resolve { .. } => {}
    }
    Ok(())
}
