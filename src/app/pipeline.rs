//! Shared pipeline logic used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! records -> normalize -> aggregate -> fit -> project
//!
//! The CLI front-end then focuses on presentation.

use crate::data::{self, FeatureClient};
use crate::domain::{
    Convergence, CumulativeSeries, FittedModels, ForecastRow, ModelKind, NormalizedSeries,
    RawRecord, RunConfig,
};
use crate::error::Error;
use crate::fit::{self, FitOptions};
use crate::forecast;
use crate::series;

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub series: NormalizedSeries,
    pub cumulative: CumulativeSeries,
    pub fits: FittedModels,
    pub rows: Vec<ForecastRow>,
}

/// Acquire raw records per the configuration: a local snapshot when one is
/// given, otherwise a fetch from the configured feature service.
pub fn load_records(config: &RunConfig) -> Result<Vec<RawRecord>, Error> {
    match &config.snapshot {
        Some(path) => data::load_snapshot(path),
        None => FeatureClient::new(config.base_url.clone()).fetch_layer(config.layer),
    }
}

/// Normalize records into a series per the configured schema and selection.
pub fn build_series(records: &[RawRecord], config: &RunConfig) -> Result<NormalizedSeries, Error> {
    series::normalize(records, &config.schema, &config.selection, &config.labels)
}

/// Execute the full forecast pipeline and return the computed outputs.
pub fn run_forecast(records: &[RawRecord], config: &RunConfig) -> Result<ForecastRun, Error> {
    let normalized = build_series(records, config)?;
    let cumulative = series::cumulative(&normalized, true)?;

    let y = cumulative.y_values();
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();

    let exp_options = FitOptions {
        patience: config.exp_patience,
        round_digits: config.round_digits,
        ..FitOptions::for_kind(ModelKind::Exponential)
    };
    let log_options = FitOptions {
        patience: config.logistic_patience,
        round_digits: config.round_digits,
        ..FitOptions::for_kind(ModelKind::Logistic)
    };

    // The two fits are independent: each reads its own x/y copies and writes
    // only its own parameters, so running them in parallel changes nothing
    // observable.
    let (exponential, logistic) = rayon::join(
        || fit::fit(ModelKind::Exponential, &x, &y, &exp_options),
        || fit::fit(ModelKind::Logistic, &x, &y, &log_options),
    );
    let fits = FittedModels {
        exponential: exponential?,
        logistic: logistic?,
    };

    let rows = forecast::project(&fits, &cumulative, config.horizon, &config.date_format)?;

    Ok(ForecastRun {
        series: normalized,
        cumulative,
        fits,
        rows,
    })
}

/// Logistic convergence-day estimate for a finished run.
///
/// Kept separate from [`run_forecast`] so a degenerate logistic fit fails
/// only this estimate, not the whole forecast table.
pub fn convergence_estimate(run: &ForecastRun, config: &RunConfig) -> Result<Convergence, Error> {
    forecast::convergence(
        &run.fits.logistic,
        run.cumulative.dates[0],
        config.convergence_threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountSelection, FieldRole, FieldSpec, LabelPolicy, RecordSchema};
    use serde_json::json;

    fn test_config() -> RunConfig {
        RunConfig {
            schema: RecordSchema::new(vec![
                FieldSpec::new("Statistikdatum", FieldRole::Timestamp),
                FieldSpec::new("Stockholm", FieldRole::Count),
            ]),
            selection: CountSelection::Declared,
            labels: LabelPolicy::default(),
            horizon: 2,
            ..RunConfig::default()
        }
    }

    fn records_with_daily_counts(counts: &[i64]) -> Vec<RawRecord> {
        // 2020-03-01 00:00:00 UTC, one record per subsequent day.
        let day0_ms = 1_583_020_800_000i64;
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut attributes = serde_json::Map::new();
                attributes.insert(
                    "Statistikdatum".to_string(),
                    json!(day0_ms + i as i64 * 86_400_000),
                );
                attributes.insert("Stockholm".to_string(), json!(c));
                RawRecord { attributes }
            })
            .collect()
    }

    #[test]
    fn forecast_run_produces_history_plus_horizon_rows() {
        // Daily increments of a logistic curve: a clean epidemic shape that
        // both model families calibrate against without degenerating.
        let curve = |x: f64| crate::models::logistic(x, 1000.0, 0.3, 12.0);
        let daily: Vec<i64> = (0..25)
            .map(|i| (curve(i as f64).round() - curve(i as f64 - 1.0).round()) as i64)
            .collect();
        let records = records_with_daily_counts(&daily);
        let config = test_config();

        let run = run_forecast(&records, &config).unwrap();

        assert_eq!(run.series.len(), 25);
        assert_eq!(run.rows.len(), 27);
        assert_eq!(run.rows[0].observed, run.cumulative.values[0]);
        assert_eq!(run.rows[25].observed, 0);
        // Cumulative stays monotonic.
        for pair in run.cumulative.values.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn too_few_dates_fail_the_fit() {
        let records = records_with_daily_counts(&[3, 4]);
        let err = run_forecast(&records, &test_config()).unwrap_err();
        assert!(matches!(err, Error::EmptySeries { needed: 3, got: 2 }));
    }
}
