//! Crate-wide error taxonomy.
//!
//! Every failure is a value returned at the point of detection; no stage
//! catches and suppresses another stage's error. User messaging (and the
//! decision to retry a fit with a different initial guess) belongs to the
//! caller, i.e. `app.rs`.

use crate::domain::ModelKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A raw record's field count, ordering, or value type does not match
    /// the declared schema.
    SchemaMismatch(String),
    /// A series with too few dates was presented for aggregation or fitting.
    ///
    /// Fitting needs at least one point per free parameter; fewer would
    /// silently produce an under-determined fit.
    EmptySeries { needed: usize, got: usize },
    /// The optimizer exhausted its iteration budget without meeting its
    /// internal tolerance.
    FitDidNotConverge { model: ModelKind, reason: String },
    /// The logistic convergence-day inversion hit an invalid logarithm or
    /// division argument (degenerate or non-converging fit).
    Domain(String),
    /// HTTP fetch or response decoding failed.
    Http(String),
    /// Local snapshot file could not be read or parsed.
    Io(String),
}

impl Error {
    /// Process exit code for the binary wrapper.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Http(_) | Error::Io(_) => 2,
            Error::SchemaMismatch(_) | Error::EmptySeries { .. } => 3,
            Error::FitDidNotConverge { .. } | Error::Domain(_) => 4,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SchemaMismatch(msg) => write!(f, "schema mismatch: {msg}"),
            Error::EmptySeries { needed, got } => {
                write!(f, "series too short: need at least {needed} dates, got {got}")
            }
            Error::FitDidNotConverge { model, reason } => write!(
                f,
                "{} fit did not converge within its iteration budget ({reason})",
                model.display_name()
            ),
            Error::Domain(msg) => write!(f, "domain error: {msg}"),
            Error::Http(msg) => write!(f, "http error: {msg}"),
            Error::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
