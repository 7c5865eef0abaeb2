//! gdreviews - employer review scraper.

mod cli;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gdreviews::config::LOG_FILENAME;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "gdreviews=debug"
    } else {
        "gdreviews=info"
    };

    let log_file = cli.log_file.clone().or_else(|| {
        std::env::var_os("LOG_PATH")
            .filter(|dir| !dir.is_empty())
            .map(|dir| PathBuf::from(dir).join(LOG_FILENAME))
    });
    let json_layer = match log_file {
        Some(ref path) => Some(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(json_layer)
        .init();

    cli::run(cli).await
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
