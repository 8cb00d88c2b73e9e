//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw record and its declared schema (`RawRecord`, `RecordSchema`)
//! - normalized and aggregated series (`NormalizedSeries`, `CumulativeSeries`)
//! - fit outputs (`ModelKind`, `ModelParams`, `FittedModels`)
//! - projection outputs (`ForecastRow`, `Convergence`)
//! - run configuration (`RunConfig`)

pub mod types;

pub use types::*;
