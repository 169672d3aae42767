mod app;
mod config;
mod error;
mod input;
mod logging;
mod model;
mod render;
mod scheduler;
mod sim;

use anyhow::Result;
use clap::Parser;
use model::Species;
use std::path::PathBuf;

/// Neo Tamagotchi: keep your pet fed and entertained.
#[derive(Parser, Debug)]
#[command(name = "neopet", version, about)]
pub(crate) struct Cli {
    /// Skip the menu and start right away with this species
    #[arg(long, value_enum)]
    pub(crate) species: Option<Species>,
    /// Pet name when starting with --species
    #[arg(long, requires = "species")]
    pub(crate) name: Option<String>,
    /// Milliseconds between ticks (overrides settings.json)
    #[arg(long)]
    pub(crate) tick_ms: Option<u64>,
    /// Basic terminal colors only
    #[arg(long)]
    pub(crate) no_color: bool,
    /// Where to write the log (default: neopet.log in the data dir)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
    /// Log filter, e.g. "debug" (NEOPET_LOG wins if set)
    #[arg(long, default_value = "info")]
    pub(crate) log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    app::run(cli)
}
