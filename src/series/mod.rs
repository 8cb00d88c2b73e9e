//! Series construction and aggregation.
//!
//! Responsibilities:
//!
//! - normalize raw records into a date-keyed count series
//! - derive cumulative totals and per-category totals

pub mod aggregate;
pub mod normalize;

pub use aggregate::*;
pub use normalize::*;
