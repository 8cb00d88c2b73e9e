//! Shared domain types.
//!
//! These types are intentionally lightweight and serializable so they can be:
//!
//! - used in-memory while normalizing/fitting
//! - printed as tables or dumped as JSON for scripting
//! - held by a caller for both model families at once (fits share no state)

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output date format (`yy-mm-dd`), also the logical series key format.
pub const DATE_FORMAT: &str = "%y-%m-%d";

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON: usize = 7;

/// Default decimal precision for reported model parameters.
///
/// Parameters are rounded once, right after fitting, so that printed and
/// exported values are stable and human-comparable across runs.
pub const PARAM_DECIMALS: i32 = 5;

/// Which growth model to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Exponential,
    Logistic,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "Exponential",
            ModelKind::Logistic => "Logistic",
        }
    }

    /// Number of free parameters (both families have three).
    pub fn param_count(self) -> usize {
        3
    }
}

/// Fitted model parameters.
///
/// Produced once per fit call and immutable thereafter. A caller may hold an
/// exponential and a logistic parameter set simultaneously; fits never share
/// mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ModelParams {
    /// `y = a * e^(k*x) + b`
    Exponential { a: f64, k: f64, b: f64 },
    /// `y = l / (1 + e^(-k*(x - x0)))`
    Logistic { l: f64, k: f64, x0: f64 },
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Exponential { .. } => ModelKind::Exponential,
            ModelParams::Logistic { .. } => ModelKind::Logistic,
        }
    }
}

/// Both fitted parameter sets for one cumulative series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModels {
    pub exponential: ModelParams,
    pub logistic: ModelParams,
}

/// A raw feature record as supplied by the upstream API or a local snapshot.
///
/// The attribute map is *ordered*; field position is part of the upstream
/// schema and is validated against [`RecordSchema`] during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub attributes: Map<String, Value>,
}

/// Role of one declared field in a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Epoch-millisecond observation timestamp; becomes the series key.
    Timestamp,
    /// A per-category count column.
    Count,
    /// Present in the upstream layout but excluded from the series.
    Metadata,
}

/// One declared field: name plus role.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, role: FieldRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Declared record layout: an ordered list of named, typed fields.
///
/// This replaces positional index windows ("columns 4..25 are regions") with
/// an explicit schema; a record must match it field-for-field, in order.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The daily per-region layer of the upstream feature service:
    /// a timestamp, three whole-country totals, then one count column per
    /// region.
    pub fn daily_regions() -> Self {
        let mut fields = vec![
            FieldSpec::new("ObjectId", FieldRole::Metadata),
            FieldSpec::new("Statistikdatum", FieldRole::Timestamp),
            FieldSpec::new("Totalt_antal_fall", FieldRole::Metadata),
            FieldSpec::new("Totalt_antal_avlidna", FieldRole::Metadata),
        ];
        for region in [
            "Blekinge",
            "Dalarna",
            "Gotland",
            "Gavleborg",
            "Halland",
            "Jamtland_Harjedalen",
            "Jonkoping",
            "Kalmar",
            "Kronoberg",
            "Norrbotten",
            "Skane",
            "Stockholm",
            "Sormland",
            "Uppsala",
            "Varmland",
            "Vasterbotten",
            "Vasternorrland",
            "Vastmanland",
            "Vastra_Gotaland",
            "Orebro",
            "Ostergotland",
        ] {
            fields.push(FieldSpec::new(region, FieldRole::Count));
        }
        Self { fields }
    }
}

/// Designated column for the deaths-only single-metric mode.
pub const DEATHS_FIELD: &str = "Totalt_antal_avlidna";

/// Which count columns feed the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountSelection {
    /// Every field declared with [`FieldRole::Count`].
    Declared,
    /// Exactly one designated numeric column (e.g. deaths-only mode),
    /// regardless of its declared role.
    Single(String),
}

/// Canonicalization of category labels.
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    /// Fixed prefix stripped from field-name-derived labels; when stripped,
    /// the remainder is capitalized (`Totalt_antal_avlidna` -> `Avlidna`).
    pub strip_prefix: Option<String>,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            strip_prefix: Some("Totalt_antal_".to_string()),
        }
    }
}

impl LabelPolicy {
    /// Derive the category label for a declared field name.
    pub fn label_for(&self, field_name: &str) -> String {
        match &self.strip_prefix {
            Some(prefix) => match field_name.strip_prefix(prefix.as_str()) {
                Some(rest) => capitalize(rest),
                None => field_name.to_string(),
            },
            None => field_name.to_string(),
        }
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// An ordered, date-keyed series of per-category counts.
///
/// Invariants (enforced by the normalizer):
/// - `dates` are unique, in chronological order of first appearance
/// - `counts[i]` is aligned with `labels` for every date, so every date
///   exposes the same category set (0 for categories absent that day)
/// - counts are non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub labels: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub counts: Vec<Vec<i64>>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sum of all category counts for one date.
    pub fn day_total(&self, idx: usize) -> i64 {
        self.counts[idx].iter().sum()
    }

    /// Label/count pairs for one date.
    pub fn category_counts(&self, idx: usize) -> impl Iterator<Item = (&str, i64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.counts[idx].iter().copied())
    }
}

/// Running (or standalone per-date) totals, one value per date.
///
/// When built with accumulation the values are monotonic non-decreasing,
/// since the underlying counts are never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<i64>,
}

impl CumulativeSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observed values as `f64`, in date order, for the fitting engine.
    pub fn y_values(&self) -> Vec<f64> {
        self.values.iter().map(|&v| v as f64).collect()
    }
}

/// One output row: a historical date with its observed total, or a future
/// date (observed = 0, no ground truth yet), plus both model estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRow {
    pub date: String,
    pub observed: i64,
    pub exponential: i64,
    pub logistic: i64,
}

/// Practical convergence estimate for a fitted logistic curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Convergence {
    /// x-position (days since the first observation) of convergence.
    pub day: i64,
    /// Calendar date of convergence.
    pub date: NaiveDate,
    /// Model value at the convergence day, truncated to a count.
    pub expected_total: i64,
}

/// A full run's configuration as understood by the pipeline.
///
/// Everything the original tool kept as module-level constants (URL
/// templates, format strings, thresholds) lives here as explicit state,
/// derived from CLI flags plus defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Feature-service base URL; the layer index is appended to it.
    pub base_url: String,
    /// Layer index of the daily per-region dataset.
    pub layer: u8,
    /// Local JSON snapshot to read instead of fetching.
    pub snapshot: Option<PathBuf>,

    pub schema: RecordSchema,
    pub selection: CountSelection,
    pub labels: LabelPolicy,

    /// Number of future days to project.
    pub horizon: usize,
    /// Normalized-curve threshold for the logistic convergence day.
    pub convergence_threshold: f64,
    /// Decimal precision of reported model parameters.
    pub round_digits: i32,
    /// Iteration budget for the exponential fit.
    pub exp_patience: usize,
    /// Iteration budget for the logistic fit (much higher; logistic fits
    /// are harder to converge).
    pub logistic_patience: usize,
    /// Date format for output rows.
    pub date_format: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: crate::data::DEFAULT_BASE_URL.to_string(),
            layer: crate::data::DAILY_REGIONS_LAYER,
            snapshot: None,
            schema: RecordSchema::daily_regions(),
            selection: CountSelection::Declared,
            labels: LabelPolicy::default(),
            horizon: DEFAULT_HORIZON,
            convergence_threshold: crate::forecast::CONVERGENCE_THRESHOLD,
            round_digits: PARAM_DECIMALS,
            exp_patience: crate::fit::EXPONENTIAL_PATIENCE,
            logistic_patience: crate::fit::LOGISTIC_PATIENCE,
            date_format: DATE_FORMAT.to_string(),
        }
    }
}
