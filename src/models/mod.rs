//! Exponential and logistic growth models.
//!
//! Models are implemented as small, pure functions so that fitting and
//! projection code can stay generic.

pub mod model;

pub use model::*;
