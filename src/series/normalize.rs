//! Series Normalizer: raw feature records -> date-keyed count series.
//!
//! A raw record is an ordered field map; the declared [`RecordSchema`] says
//! which field is the timestamp, which are category counts, and which are
//! metadata to skip. Normalization is a pure transformation:
//!
//! - epoch-millisecond timestamps become calendar dates (the series key)
//! - null counts coerce to 0; fractional or negative counts are rejected
//! - category labels are canonicalized per [`LabelPolicy`]
//! - records sharing a date are merged by summing into the first row

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::domain::{
    CountSelection, FieldRole, LabelPolicy, NormalizedSeries, RawRecord, RecordSchema,
};
use crate::error::Error;

/// Build a [`NormalizedSeries`] from raw records.
///
/// Fails with [`Error::SchemaMismatch`] when a record's field count or
/// ordering does not match the declared layout, or when a count value is
/// non-numeric, fractional, or negative.
pub fn normalize(
    records: &[RawRecord],
    schema: &RecordSchema,
    selection: &CountSelection,
    labels: &LabelPolicy,
) -> Result<NormalizedSeries, Error> {
    let ts_idx = timestamp_index(schema)?;
    let count_idx = count_indices(schema, selection)?;

    let label_vec: Vec<String> = count_idx
        .iter()
        .map(|&i| labels.label_for(&schema.fields[i].name))
        .collect();

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut counts: Vec<Vec<i64>> = Vec::new();
    let mut row_of: HashMap<NaiveDate, usize> = HashMap::new();

    for record in records {
        check_layout(record, schema)?;

        let values: Vec<&Value> = record.attributes.values().collect();
        let date = date_from_millis(&schema.fields[ts_idx].name, values[ts_idx])?;

        let mut row = Vec::with_capacity(count_idx.len());
        for &i in &count_idx {
            row.push(count_value(&schema.fields[i].name, values[i])?);
        }

        match row_of.get(&date) {
            Some(&existing) => {
                for (slot, v) in counts[existing].iter_mut().zip(row) {
                    *slot += v;
                }
            }
            None => {
                row_of.insert(date, dates.len());
                dates.push(date);
                counts.push(row);
            }
        }
    }

    Ok(NormalizedSeries {
        labels: label_vec,
        dates,
        counts,
    })
}

fn timestamp_index(schema: &RecordSchema) -> Result<usize, Error> {
    let mut found = None;
    for (i, field) in schema.fields.iter().enumerate() {
        if field.role == FieldRole::Timestamp {
            if found.is_some() {
                return Err(Error::SchemaMismatch(
                    "schema declares more than one timestamp field".to_string(),
                ));
            }
            found = Some(i);
        }
    }
    found.ok_or_else(|| Error::SchemaMismatch("schema declares no timestamp field".to_string()))
}

fn count_indices(schema: &RecordSchema, selection: &CountSelection) -> Result<Vec<usize>, Error> {
    match selection {
        CountSelection::Declared => {
            let idx: Vec<usize> = schema
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f.role == FieldRole::Count)
                .map(|(i, _)| i)
                .collect();
            if idx.is_empty() {
                return Err(Error::SchemaMismatch(
                    "schema declares no count fields".to_string(),
                ));
            }
            Ok(idx)
        }
        CountSelection::Single(name) => {
            let (i, field) = schema
                .fields
                .iter()
                .enumerate()
                .find(|(_, f)| f.name == *name)
                .ok_or_else(|| {
                    Error::SchemaMismatch(format!("single-metric field '{name}' is not declared"))
                })?;
            if field.role == FieldRole::Timestamp {
                return Err(Error::SchemaMismatch(format!(
                    "single-metric field '{name}' is the timestamp field"
                )));
            }
            Ok(vec![i])
        }
    }
}

fn check_layout(record: &RawRecord, schema: &RecordSchema) -> Result<(), Error> {
    if record.attributes.len() != schema.fields.len() {
        return Err(Error::SchemaMismatch(format!(
            "expected {} fields, record has {}",
            schema.fields.len(),
            record.attributes.len()
        )));
    }
    for (pos, (name, field)) in record.attributes.keys().zip(&schema.fields).enumerate() {
        if *name != field.name {
            return Err(Error::SchemaMismatch(format!(
                "field {pos} is '{name}', schema declares '{}'",
                field.name
            )));
        }
    }
    Ok(())
}

/// Epoch milliseconds -> UTC calendar date (milliseconds truncated).
fn date_from_millis(field: &str, value: &Value) -> Result<NaiveDate, Error> {
    let millis = value.as_i64().ok_or_else(|| {
        Error::SchemaMismatch(format!("timestamp field '{field}' is not an integer"))
    })?;
    let secs = millis.div_euclid(1000);
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            Error::SchemaMismatch(format!("timestamp field '{field}' is out of range: {millis}"))
        })
}

/// Null coerces to 0; anything non-integral or negative is a layout error.
fn count_value(field: &str, value: &Value) -> Result<i64, Error> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => {
            let v = if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                if f.fract() != 0.0 {
                    return Err(Error::SchemaMismatch(format!(
                        "count field '{field}' has fractional value {f}"
                    )));
                }
                f as i64
            } else {
                return Err(Error::SchemaMismatch(format!(
                    "count field '{field}' is out of integer range"
                )));
            };
            if v < 0 {
                return Err(Error::SchemaMismatch(format!(
                    "count field '{field}' has negative value {v}"
                )));
            }
            Ok(v)
        }
        other => Err(Error::SchemaMismatch(format!(
            "count field '{field}' is not numeric: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldSpec;
    use serde_json::json;

    fn schema() -> RecordSchema {
        RecordSchema::new(vec![
            FieldSpec::new("Statistikdatum", FieldRole::Timestamp),
            FieldSpec::new("Totalt_antal_fall", FieldRole::Metadata),
            FieldSpec::new("Stockholm", FieldRole::Count),
            FieldSpec::new("Uppsala", FieldRole::Count),
        ])
    }

    fn record(entries: &[(&str, Value)]) -> RawRecord {
        let mut attributes = serde_json::Map::new();
        for (k, v) in entries {
            attributes.insert(k.to_string(), v.clone());
        }
        RawRecord { attributes }
    }

    // 2020-03-01 00:00:00 UTC in epoch milliseconds.
    const DAY0_MS: i64 = 1_583_020_800_000;
    const DAY_MS: i64 = 86_400_000;

    fn day(offset: i64, total: Value, stockholm: Value, uppsala: Value) -> RawRecord {
        record(&[
            ("Statistikdatum", json!(DAY0_MS + offset * DAY_MS)),
            ("Totalt_antal_fall", total),
            ("Stockholm", stockholm),
            ("Uppsala", uppsala),
        ])
    }

    #[test]
    fn normalizes_dates_and_counts_in_order() {
        let records = vec![
            day(0, json!(12), json!(10), json!(2)),
            day(1, json!(5), json!(1), json!(4)),
        ];
        let series =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap();

        assert_eq!(series.labels, vec!["Stockholm", "Uppsala"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.dates[0], NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(series.dates[1], NaiveDate::from_ymd_opt(2020, 3, 2).unwrap());
        assert_eq!(series.counts, vec![vec![10, 2], vec![1, 4]]);
        assert_eq!(series.day_total(0), 12);
    }

    #[test]
    fn null_count_coerces_to_zero() {
        let records = vec![day(0, json!(3), Value::Null, json!(3))];
        let series =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap();

        // The category key survives with a zero count, never a missing key.
        assert_eq!(series.labels.len(), 2);
        assert_eq!(series.counts[0], vec![0, 3]);
    }

    #[test]
    fn fractional_count_is_a_schema_mismatch() {
        let records = vec![day(0, json!(1), json!(1.5), json!(0))];
        let err =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn negative_count_is_a_schema_mismatch() {
        let records = vec![day(0, json!(1), json!(-2), json!(0))];
        let err =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn wrong_field_count_is_a_schema_mismatch() {
        let records = vec![record(&[("Statistikdatum", json!(DAY0_MS))])];
        let err =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn wrong_field_order_is_a_schema_mismatch() {
        let records = vec![record(&[
            ("Statistikdatum", json!(DAY0_MS)),
            ("Totalt_antal_fall", json!(1)),
            ("Uppsala", json!(1)),
            ("Stockholm", json!(0)),
        ])];
        let err =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn duplicate_dates_merge_into_first_row() {
        // Two records on the same calendar day: counts add up, one row out.
        let records = vec![
            day(0, json!(2), json!(2), json!(0)),
            day(0, json!(3), json!(1), json!(2)),
            day(1, json!(1), json!(1), json!(0)),
        ];
        let series =
            normalize(&records, &schema(), &CountSelection::Declared, &LabelPolicy::default())
                .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.counts[0], vec![3, 2]);
    }

    #[test]
    fn single_metric_selects_one_designated_column() {
        let records = vec![day(0, json!(7), json!(5), json!(2))];
        let selection = CountSelection::Single("Totalt_antal_fall".to_string());
        let series = normalize(&records, &schema(), &selection, &LabelPolicy::default()).unwrap();

        assert_eq!(series.labels, vec!["Fall"]);
        assert_eq!(series.counts[0], vec![7]);
    }

    #[test]
    fn single_metric_unknown_field_fails() {
        let selection = CountSelection::Single("Nope".to_string());
        let err = normalize(&[], &schema(), &selection, &LabelPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let series =
            normalize(&[], &schema(), &CountSelection::Declared, &LabelPolicy::default()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.labels.len(), 2);
    }
}
