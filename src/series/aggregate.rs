//! Aggregator: derived views over a normalized series.
//!
//! Three pure functions:
//!
//! - [`cumulative`] — per-date totals, running-summed or standalone
//! - [`cumulative_by_category`] — per-date counts kept per category,
//!   running-summed or standalone
//! - [`totals_by_category`] — cross-date sum per category, unordered
//!
//! Presentation ordering of category totals is a caller concern.

use std::collections::HashMap;

use crate::domain::{CumulativeSeries, NormalizedSeries};
use crate::error::Error;

/// Per-date totals over the series, in date order.
///
/// With `accumulate = true` each value is the running total of all per-date
/// sums up to and including that date; counts are never negative, so the
/// result is monotonic non-decreasing. With `accumulate = false` each value
/// is that date's standalone total.
pub fn cumulative(series: &NormalizedSeries, accumulate: bool) -> Result<CumulativeSeries, Error> {
    if series.is_empty() {
        return Err(Error::EmptySeries { needed: 1, got: 0 });
    }

    let mut values = Vec::with_capacity(series.len());
    let mut running = 0i64;
    for idx in 0..series.len() {
        let day = series.day_total(idx);
        let value = if accumulate {
            running += day;
            running
        } else {
            day
        };
        values.push(value);
    }

    Ok(CumulativeSeries {
        dates: series.dates.clone(),
        values,
    })
}

/// Per-date counts broken out per category, in date order.
///
/// With `accumulate = true` each category column is running-summed down the
/// dates, so `counts[i]` holds each category's total up to and including
/// that date; with `accumulate = false` the counts pass through unchanged.
/// Labels and dates are preserved, so the result upholds the same
/// invariants as the input series.
pub fn cumulative_by_category(
    series: &NormalizedSeries,
    accumulate: bool,
) -> Result<NormalizedSeries, Error> {
    if series.is_empty() {
        return Err(Error::EmptySeries { needed: 1, got: 0 });
    }
    if !accumulate {
        return Ok(series.clone());
    }

    let mut running = vec![0i64; series.labels.len()];
    let mut counts = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        for (slot, count) in running.iter_mut().zip(&series.counts[idx]) {
            *slot += count;
        }
        counts.push(running.clone());
    }

    Ok(NormalizedSeries {
        labels: series.labels.clone(),
        dates: series.dates.clone(),
        counts,
    })
}

/// Sum of each category's counts across all dates.
///
/// Returns an unordered mapping; sorting for display is left to the report.
pub fn totals_by_category(series: &NormalizedSeries) -> Result<HashMap<String, i64>, Error> {
    if series.is_empty() {
        return Err(Error::EmptySeries { needed: 1, got: 0 });
    }

    let mut totals: HashMap<String, i64> = HashMap::with_capacity(series.labels.len());
    for idx in 0..series.len() {
        for (label, count) in series.category_counts(idx) {
            *totals.entry(label.to_string()).or_insert(0) += count;
        }
    }
    Ok(totals)
}
