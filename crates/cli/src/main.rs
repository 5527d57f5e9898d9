// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! csp-demo - process networks built on altable barriers

mod commands;
mod config;
mod error;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{philosophers, ring};
use std::path::PathBuf;

use crate::config::DemoConfig;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "csp-demo",
    version,
    about = "Process networks that synchronise on altable barriers"
)]
struct Cli {
    /// TOML file with demo settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dining philosophers whose forks alternate over barriers
    Philosophers(philosophers::PhilosophersArgs),
    /// A ring of processes choosing between neighbour barriers
    Ring(ring::RingArgs),
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "csp-demo", &mut std::io::stdout());
        return Ok(());
    }

    setup_logging();
    let config = DemoConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Philosophers(args) => {
            let settings = args.apply(config.philosophers);
            tracing::info!(
                philosophers = settings.count,
                meals = settings.meals,
                "college opens"
            );
            let report = philosophers::run(&settings, config.base_delay)?;
            output::print(&report, cli.format);
        }
        Commands::Ring(args) => {
            let settings = args.apply(config.ring);
            tracing::info!(size = settings.size, rounds = settings.rounds, "ring starts");
            let report = ring::run(&settings, config.base_delay)?;
            output::print(&report, cli.format);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Log to stderr so reports on stdout stay machine-readable
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
