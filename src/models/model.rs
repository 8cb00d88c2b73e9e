//! Growth-model evaluation.
//!
//! The fitter and the projector both rely on one primitive: evaluate a model
//! at a given x-position. Models are plain functions so fitting and
//! projection code can stay generic over [`ModelParams`].

use crate::domain::ModelParams;

/// `a * e^(k*x) + b` — early unconstrained growth.
pub fn exponential(x: f64, a: f64, k: f64, b: f64) -> f64 {
    a * (k * x).exp() + b
}

/// `l / (1 + e^(-k*(x - x0)))` — growth approaching a saturation level `l`.
pub fn logistic(x: f64, l: f64, k: f64, x0: f64) -> f64 {
    l / (1.0 + (-k * (x - x0)).exp())
}

/// Evaluate a fitted model at `x`.
pub fn predict(params: &ModelParams, x: f64) -> f64 {
    match *params {
        ModelParams::Exponential { a, k, b } => exponential(x, a, k, b),
        ModelParams::Logistic { l, k, x0 } => logistic(x, l, k, x0),
    }
}
