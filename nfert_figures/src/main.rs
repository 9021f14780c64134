use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};
use crate::pipelines::{run_nue_grid, run_yield_fit};
use crate::plotting::style::FigureStyle;

mod models;
mod data_handling;
mod helper_functions;
mod analysis;
mod plotting;
mod cli;
mod pipelines;

fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting the N fertilizer figure pipeline");

    let style = FigureStyle::load(args.style.as_deref())?;

    match &args.command {
        Command::NueGrid(grid) => run_nue_grid(grid, &style)?,
        Command::YieldFit(yield_args) => run_yield_fit(yield_args, &style)?,
    }

    info!("Done");
    Ok(())
}
