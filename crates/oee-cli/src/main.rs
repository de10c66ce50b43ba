use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use oee_cli::commands::{ingest, report, status, transitions};
use oee_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(oee_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = oee_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Status) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            status::run(&mut stdout(), &config)?;
        }
        Some(Commands::Ingest { file }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            ingest::run(&mut stdout(), &mut db, file.as_deref())?;
        }
        Some(Commands::Report {
            entity,
            start,
            end,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            report::run(
                &mut stdout(),
                &db,
                &config.oee_input(),
                entity,
                *start,
                *end,
                *json,
            )?;
        }
        Some(Commands::Transitions {
            entity,
            start,
            end,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            transitions::run(&mut stdout(), &db, entity, *start, *end, *json, Utc::now())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
