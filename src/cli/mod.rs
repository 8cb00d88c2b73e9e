//! Command-line parsing for the case-count forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the numeric pipeline; the core exposes pure
//! functions and never reads flags itself.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_HORIZON;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "Daily case-count series and growth-model forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit exponential and logistic models to the cumulative series and
    /// print the forecast table.
    Forecast(ForecastArgs),
    /// Print the running total per date (or standalone per-date totals).
    Cumulative(SeriesArgs),
    /// Print total counts per category, ascending.
    Totals(SourceArgs),
}

/// Where the raw records come from and which counts to use.
#[derive(Debug, Parser, Clone)]
pub struct SourceArgs {
    /// Read records from a local feature-collection JSON snapshot instead
    /// of fetching from the feature service.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Use only the designated deaths column instead of the per-region
    /// count columns.
    #[arg(long)]
    pub deaths: bool,
}

/// Options for the forecast command.
#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of future days to project.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Normalized-curve threshold for the logistic convergence day.
    #[arg(long, default_value_t = crate::forecast::CONVERGENCE_THRESHOLD)]
    pub threshold: f64,

    /// Print the forecast rows as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Options for the cumulative command.
#[derive(Debug, Parser, Clone)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print standalone per-date totals instead of the running total.
    #[arg(long)]
    pub daily: bool,

    /// Break each date out into its per-region (per-category) counts
    /// instead of a single day total.
    #[arg(long)]
    pub by_region: bool,
}
