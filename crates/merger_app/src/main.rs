mod app;
mod config;
mod logging;
mod render;
mod shortcuts;

use std::path::PathBuf;

use clap::Parser;

use crate::app::RunOptions;
use crate::config::{load_file_config, AppConfig};
use crate::logging::{LogDestination, DEFAULT_LOG_FILE};

/// Terminal client for the archive merge service.
#[derive(Debug, Parser)]
#[command(name = "merger", version)]
struct Args {
    /// ZIP archive to submit right away.
    archive: Option<PathBuf>,
    /// Base URL of the merge service.
    #[arg(long)]
    server: Option<String>,
    /// RON settings file (defaults to ./merger.ron when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where downloaded results are written.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Log only to this file instead of the terminal and ./merger.log.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Process the archive, download the results, and exit.
    #[arg(long, requires = "archive")]
    batch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_config = load_file_config(args.config.as_deref())?;
    let mut config = AppConfig::default();
    config.apply(file_config);
    if let Some(server) = args.server {
        config.client.base_url = server;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let level = config
        .log_level
        .as_deref()
        .map(engine_logging::parse_level)
        .unwrap_or_else(engine_logging::default_level);
    let destination = match args.log_file {
        Some(path) => LogDestination::File(path),
        None if args.batch => LogDestination::Terminal,
        None => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
    };
    logging::initialize(destination, level);

    app::run(RunOptions {
        config,
        archive: args.archive,
        batch: args.batch,
    })
    .await
}
