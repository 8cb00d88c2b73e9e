//! Forecast Projector: fitted models -> dated comparison and forecast rows.
//!
//! Historical x-positions are `0..n-1` in date order; the forecast horizon
//! continues at `n..n+horizon-1` with calendar dates one day apart. For the
//! logistic model we also invert the curve algebraically to estimate the
//! day it first comes within a fixed tolerance of its asymptote.

use chrono::{Duration, NaiveDate};

use crate::domain::{Convergence, CumulativeSeries, FittedModels, ForecastRow, ModelParams};
use crate::error::Error;
use crate::models::predict;

/// Normalized-curve threshold for the practical convergence day.
///
/// Exactly 1.0 is reached only at infinity; a value just above 1 yields a
/// finite date. The constant is a tuning value carried over from the
/// original tool; override it through `RunConfig` if needed.
pub const CONVERGENCE_THRESHOLD: f64 = 1.0001;

/// Evaluate both fitted models over the historical dates and `horizon`
/// additional future days.
///
/// Historical rows pair the model estimates with the observed cumulative
/// value; future rows carry 0 as the observed value (no ground truth yet)
/// and continue the date sequence by one day per step. Model values are
/// truncated to integer counts.
pub fn project(
    fits: &FittedModels,
    cumulative: &CumulativeSeries,
    horizon: usize,
    date_format: &str,
) -> Result<Vec<ForecastRow>, Error> {
    if cumulative.is_empty() {
        return Err(Error::EmptySeries { needed: 1, got: 0 });
    }

    let n = cumulative.len();
    let mut rows = Vec::with_capacity(n + horizon);

    for (i, date) in cumulative.dates.iter().enumerate() {
        rows.push(row(fits, *date, cumulative.values[i], i as f64, date_format));
    }

    let last = cumulative.dates[n - 1];
    for step in 1..=horizon {
        let date = last + Duration::days(step as i64);
        let x = (n - 1 + step) as f64;
        rows.push(row(fits, date, 0, x, date_format));
    }

    Ok(rows)
}

fn row(
    fits: &FittedModels,
    date: NaiveDate,
    observed: i64,
    x: f64,
    date_format: &str,
) -> ForecastRow {
    ForecastRow {
        date: date.format(date_format).to_string(),
        observed,
        exponential: predict(&fits.exponential, x).trunc() as i64,
        logistic: predict(&fits.logistic, x).trunc() as i64,
    }
}

/// The x-position at which a logistic curve with rate `k` and midpoint `x0`
/// first reaches `threshold` on the normalized curve `y/L`, by algebraic
/// inversion.
///
/// Fails with [`Error::Domain`] when `k` is zero (or non-finite) or when
/// the threshold places the argument of the logarithm outside `(0, inf)`;
/// both indicate a degenerate or non-converging fit and no fallback value
/// is synthesized.
pub fn last_day(k: f64, x0: f64, threshold: f64) -> Result<i64, Error> {
    if !k.is_finite() || k == 0.0 {
        return Err(Error::Domain(format!(
            "logistic rate k = {k} admits no convergence day"
        )));
    }

    let denom = threshold * (-k).exp() - 1.0;
    if denom == 0.0 {
        return Err(Error::Domain(
            "convergence threshold makes the inversion denominator zero".to_string(),
        ));
    }

    let arg = (1.0 - threshold) / denom;
    if !arg.is_finite() || arg <= 0.0 {
        return Err(Error::Domain(format!(
            "logarithm argument {arg} is outside (0, inf) for threshold {threshold}"
        )));
    }

    let x = (-1.0 / k) * arg.ln() + x0;
    if !x.is_finite() {
        return Err(Error::Domain("convergence day is not finite".to_string()));
    }
    Ok(x.round() as i64)
}

/// Convergence-day estimate for a fitted logistic model: the calendar date
/// (counted from the first observation date) and the expected total there.
pub fn convergence(
    params: &ModelParams,
    start: NaiveDate,
    threshold: f64,
) -> Result<Convergence, Error> {
    let ModelParams::Logistic { l: _, k, x0 } = *params else {
        return Err(Error::Domain(
            "convergence day is defined for the logistic model only".to_string(),
        ));
    };

    let day = last_day(k, x0, threshold)?;
    Ok(Convergence {
        day,
        date: start + Duration::days(day),
        expected_total: predict(params, day as f64).trunc() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DATE_FORMAT;
    use crate::models::logistic;

    fn fits() -> FittedModels {
        FittedModels {
            exponential: ModelParams::Exponential { a: 2.0, k: 0.1, b: 0.0 },
            logistic: ModelParams::Logistic { l: 1000.0, k: 0.3, x0: 10.0 },
        }
    }

    fn cumulative_of(values: &[i64]) -> CumulativeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        CumulativeSeries {
            dates: (0..values.len())
                .map(|i| start + Duration::days(i as i64))
                .collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn horizon_appends_dated_future_rows() {
        let cumulative = cumulative_of(&[10, 25, 25, 30]);
        let rows = project(&fits(), &cumulative, 2, DATE_FORMAT).unwrap();

        assert_eq!(rows.len(), 6);
        // Historical rows keep the observed values.
        assert_eq!(rows[0].date, "20-03-01");
        assert_eq!(rows[0].observed, 10);
        assert_eq!(rows[3].observed, 30);
        // Future rows continue the date sequence by +1/+2 days, observed 0.
        assert_eq!(rows[4].date, "20-03-05");
        assert_eq!(rows[5].date, "20-03-06");
        assert_eq!(rows[4].observed, 0);
        assert_eq!(rows[5].observed, 0);
    }

    #[test]
    fn estimates_continue_the_x_sequence() {
        let cumulative = cumulative_of(&[10, 25, 25, 30]);
        let rows = project(&fits(), &cumulative, 1, DATE_FORMAT).unwrap();

        // First future row is evaluated at x = 4.
        let expected = predict(&fits().exponential, 4.0).trunc() as i64;
        assert_eq!(rows[4].exponential, expected);
    }

    #[test]
    fn empty_series_cannot_be_projected() {
        let cumulative = CumulativeSeries { dates: vec![], values: vec![] };
        let err = project(&fits(), &cumulative, 7, DATE_FORMAT).unwrap_err();
        assert!(matches!(err, Error::EmptySeries { .. }));
    }

    #[test]
    fn last_day_lands_beyond_the_inflection_point() {
        let (l, k, x0) = (1000.0, 0.3, 10.0);
        let day = last_day(k, x0, CONVERGENCE_THRESHOLD).unwrap();

        assert!(day > x0 as i64, "day {day} not beyond midpoint");
        let value = logistic(day as f64, l, k, x0);
        assert!(value > l * 0.999, "value {value} short of the asymptote");
    }

    #[test]
    fn zero_rate_is_a_domain_error() {
        assert!(matches!(
            last_day(0.0, 10.0, CONVERGENCE_THRESHOLD),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn threshold_at_one_is_a_domain_error() {
        // Exactly 1.0 corresponds to the asymptote, reached only at infinity.
        assert!(matches!(last_day(0.3, 10.0, 1.0), Err(Error::Domain(_))));
    }

    #[test]
    fn convergence_is_logistic_only() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let exp = ModelParams::Exponential { a: 1.0, k: 0.1, b: 0.0 };
        assert!(matches!(
            convergence(&exp, start, CONVERGENCE_THRESHOLD),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn convergence_reports_date_and_expected_total() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let params = ModelParams::Logistic { l: 1000.0, k: 0.3, x0: 10.0 };
        let c = convergence(&params, start, CONVERGENCE_THRESHOLD).unwrap();

        assert_eq!(c.date, start + Duration::days(c.day));
        assert!(c.expected_total >= 999 && c.expected_total <= 1000);
    }
}
