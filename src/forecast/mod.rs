//! Forecast Projector.
//!
//! Responsibilities:
//!
//! - evaluate fitted models over historical and future x-positions
//! - date the forecast horizon one day per step past the last observation
//! - estimate the logistic practical-convergence day

pub mod project;

pub use project::*;
