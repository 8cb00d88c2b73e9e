//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into a `RunConfig`
//! - acquires records (fetch or snapshot)
//! - runs the normalize/aggregate/fit/project pipeline
//! - prints reports
//!
//! It is also the messaging boundary of the error design: pipeline errors
//! propagate out of here untouched, and only the optional convergence
//! estimate is reported on stderr without failing the run.

use clap::Parser;

use crate::cli::{Cli, Command, ForecastArgs, SeriesArgs, SourceArgs};
use crate::domain::{CountSelection, DEATHS_FIELD, RunConfig};
use crate::error::Error;
use crate::report;

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Cumulative(args) => handle_cumulative(args),
        Command::Totals(args) => handle_totals(args),
    }
}

fn config_from_source(source: &SourceArgs) -> RunConfig {
    RunConfig {
        snapshot: source.snapshot.clone(),
        selection: if source.deaths {
            CountSelection::Single(DEATHS_FIELD.to_string())
        } else {
            CountSelection::Declared
        },
        ..RunConfig::default()
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), Error> {
    let mut config = config_from_source(&args.source);
    config.horizon = args.horizon;
    config.convergence_threshold = args.threshold;

    let records = pipeline::load_records(&config)?;
    let run = pipeline::run_forecast(&records, &config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&run.rows)
            .map_err(|e| Error::Io(format!("failed to serialize forecast rows: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", report::format_models(&run.fits));
    print!("{}", report::format_forecast_table(&run.rows));
    println!();

    // A degenerate logistic fit invalidates only this estimate; report it
    // without synthesizing a stand-in value.
    match pipeline::convergence_estimate(&run, &config) {
        Ok(convergence) => {
            print!("{}", report::format_convergence(&convergence, &config.date_format));
        }
        Err(err) => eprintln!("no convergence estimate: {err}"),
    }

    Ok(())
}

fn handle_cumulative(args: SeriesArgs) -> Result<(), Error> {
    let config = config_from_source(&args.source);

    let records = pipeline::load_records(&config)?;
    let series = pipeline::build_series(&records, &config)?;

    if args.by_region {
        let breakdown = crate::series::cumulative_by_category(&series, !args.daily)?;
        print!("{}", report::format_by_category(&breakdown, &config.date_format));
    } else {
        let totals = crate::series::cumulative(&series, !args.daily)?;
        print!("{}", report::format_cumulative(&totals, &config.date_format));
    }
    Ok(())
}

fn handle_totals(args: SourceArgs) -> Result<(), Error> {
    let config = config_from_source(&args);

    let records = pipeline::load_records(&config)?;
    let series = pipeline::build_series(&records, &config)?;
    let totals = crate::series::totals_by_category(&series)?;

    print!("{}", report::format_totals(&totals));
    Ok(())
}
