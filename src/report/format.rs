//! Terminal formatting for series tables and forecasts.
//!
//! We keep formatting in one place so:
//! - the numeric pipeline stays clean and testable
//! - output changes are localized
//!
//! Nothing here mutates pipeline results; suppression and ordering for
//! presentation (e.g. ascending category totals) happen at this boundary.

use std::collections::HashMap;

use crate::domain::{
    Convergence, CumulativeSeries, FittedModels, ForecastRow, ModelParams, NormalizedSeries,
};

/// Fitted-model summary lines.
pub fn format_models(fits: &FittedModels) -> String {
    let mut out = String::new();
    if let ModelParams::Exponential { a, k, b } = fits.exponential {
        out.push_str(&format!("EXPONENTIAL:\t{a}e^({k}x)+{b}\n"));
    }
    if let ModelParams::Logistic { l, k, x0 } = fits.logistic {
        out.push_str(&format!("LOGISTIC:\t{l}/(1+e^(-{k}(x-{x0})))\n"));
    }
    out
}

/// The forecast comparison table: one row per historical date, then the
/// forecast horizon.
pub fn format_forecast_table(rows: &[ForecastRow]) -> String {
    let header = format!(
        "{:10}{:>12}{:>12}{:>12}",
        "Date", "Real", "Exp", "Log"
    );
    let rule = "-".repeat(header.len());

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{:10}{:>12}{:>12}{:>12}\n",
            row.date,
            fmt_count(row.observed),
            fmt_count(row.exponential),
            fmt_count(row.logistic),
        ));
    }
    out
}

/// Logistic convergence summary.
pub fn format_convergence(convergence: &Convergence, date_format: &str) -> String {
    format!(
        "LAST DAY BASED ON LOGISTIC FUNCTION:\t{}\nESTIMATED TOTAL ON LAST DAY:\t\t{}\n",
        convergence.date.format(date_format),
        fmt_count(convergence.expected_total),
    )
}

/// Date/value table for a cumulative (or per-date totals) series.
pub fn format_cumulative(series: &CumulativeSeries, date_format: &str) -> String {
    let mut out = String::new();
    for (date, value) in series.dates.iter().zip(&series.values) {
        out.push_str(&format!(
            "{:<15}{:>12}\n",
            date.format(date_format).to_string(),
            fmt_count(*value)
        ));
    }
    out
}

/// Per-category breakdown: one block per date, the date on its own line
/// followed by each category's count, blocks separated by a blank line.
///
/// The series is printed as given; pass it through
/// [`crate::series::cumulative_by_category`] first for running totals.
pub fn format_by_category(series: &NormalizedSeries, date_format: &str) -> String {
    let mut out = String::new();
    for idx in 0..series.len() {
        out.push_str(&series.dates[idx].format(date_format).to_string());
        out.push('\n');
        for (label, count) in series.category_counts(idx) {
            out.push_str(&format!("{label:<20}{:>15}\n", fmt_count(count)));
        }
        out.push('\n');
    }
    out
}

/// Per-category totals, ascending by total (ties broken by label so output
/// is deterministic).
pub fn format_totals(totals: &HashMap<String, i64>) -> String {
    let mut entries: Vec<(&str, i64)> = totals.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (label, total) in entries {
        out.push_str(&format!("{label:<20}{:>15}\n", fmt_count(total)));
    }
    out
}

/// Thousands-separated integer, matching the original tool's tables.
fn fmt_count(n: i64) -> String {
    let negative = n < 0;
    let digits = n.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
