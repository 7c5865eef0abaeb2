//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod company;
mod discover;
mod helpers;
mod init;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gdreviews::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "gdreviews")]
#[command(about = "Employer review and rating scraper")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the database and config file
    #[arg(long, global = true, env = "GDREVIEWS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Append JSON log lines to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Manage tracked companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Resolve company names to employer ids through the site search
    Discover {
        /// Number of concurrent lookups (default: from settings)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Look up companies that already have an employer id again
        #[arg(short, long)]
        all: bool,
    },

    /// Derive review listing URLs for every resolved company
    Urls,

    /// Scrape reviews for tracked companies into the database
    Scrape {
        /// Restrict the run to these employer ids
        #[arg(short, long = "employer-id")]
        employer_ids: Vec<i64>,
        /// Number of concurrent sessions (default: from settings)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Maximum listing pages per company
        #[arg(short, long)]
        max_pages: Option<u32>,
    },

    /// Scrape one listing URL and print the result as JSON
    Fetch {
        /// Review listing URL (old overview URLs are converted)
        url: String,
        /// Maximum listing pages to read
        #[arg(short, long)]
        max_pages: Option<u32>,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Track companies by name
    Add {
        /// Company names to look up later
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List tracked companies
    List,
}

/// Dispatch a parsed command line. Logging is already installed.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Company { command } => match command {
            CompanyCommands::Add { names } => company::cmd_company_add(&settings, &names).await,
            CompanyCommands::List => company::cmd_company_list(&settings).await,
        },
        Commands::Discover { workers, all } => {
            discover::cmd_discover(&settings, workers.unwrap_or(settings.workers), all).await
        }
        Commands::Urls => discover::cmd_urls(&settings).await,
        Commands::Scrape {
            employer_ids,
            workers,
            max_pages,
        } => {
            scrape::cmd_scrape(
                &settings,
                &employer_ids,
                workers.unwrap_or(settings.workers),
                max_pages,
            )
            .await
        }
        Commands::Fetch { url, max_pages } => scrape::cmd_fetch(&settings, &url, max_pages).await,
    }
}
