// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atelier - Telegram order intake for a leather workshop.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod report;
mod serve;

use std::path::PathBuf;

use atelier_config::model::AtelierConfig;
use clap::{Parser, Subcommand};
use tracing::error;

/// Atelier - Telegram order intake for a leather workshop.
#[derive(Parser, Debug)]
#[command(name = "atelier", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file (plus ATELIER_* env) instead of the
    /// standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot until SIGINT or SIGTERM.
    Serve,
    /// Write orders to a CSV file in the reports directory.
    Export {
        /// Export only this order.
        #[arg(long, value_name = "ID")]
        order: Option<i64>,
    },
    /// Print order statistics.
    Stats,
    /// Check configuration, database, reports directory and bot token.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> AtelierConfig {
    let loaded = match path {
        Some(path) => atelier_config::load_and_validate_path(path),
        None => atelier_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            atelier_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atelier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.bot.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Export { order } => report::run_export(&config, order)
            .await
            .map(|path| println!("{}", path.display())),
        Commands::Stats => report::run_stats(&config)
            .await
            .map(|text| println!("{text}")),
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await,
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
