//! Curve Fitting Engine.
//!
//! Responsibilities:
//!
//! - least-squares calibration of the exponential and logistic models
//! - explicit initial-guess policy and per-model iteration budgets
//! - stable (rounded) parameter output

pub mod engine;

pub use engine::*;
