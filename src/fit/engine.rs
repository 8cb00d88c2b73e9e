//! Nonlinear least-squares fitting of growth models.
//!
//! Given aligned `x` positions and observed cumulative values `y`, we
//! minimize the sum of squared residuals over the three free parameters of
//! the chosen model with Levenberg-Marquardt, starting from an explicit
//! initial guess. Jacobians are analytic.
//!
//! The logistic fit gets a much higher iteration budget than the
//! exponential fit; it is markedly harder to converge.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{Dyn, OMatrix, OVector, Owned, U3, Vector3};

use crate::domain::{ModelKind, ModelParams, PARAM_DECIMALS};
use crate::error::Error;
use crate::models::{exponential, logistic};

/// Iteration budget for the exponential fit.
pub const EXPONENTIAL_PATIENCE: usize = 1_000;

/// Iteration budget for the logistic fit.
pub const LOGISTIC_PATIENCE: usize = 100_000;

/// Fitting options: initial-guess policy and iteration budget.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Initial parameter guess, in model order: `(a, k, b)` for the
    /// exponential, `(l, k, x0)` for the logistic.
    pub guess: [f64; 3],
    /// Iteration budget; exhausting it fails the fit.
    pub patience: usize,
    /// Decimal precision of the returned parameters.
    pub round_digits: i32,
}

impl FitOptions {
    /// The default policy for a model kind: guess `(0, 0.1, 0)` with the
    /// kind's iteration budget.
    pub fn for_kind(kind: ModelKind) -> Self {
        Self {
            guess: [0.0, 0.1, 0.0],
            patience: match kind {
                ModelKind::Exponential => EXPONENTIAL_PATIENCE,
                ModelKind::Logistic => LOGISTIC_PATIENCE,
            },
            round_digits: PARAM_DECIMALS,
        }
    }
}

/// One curve-fit problem instance; owns its `x`/`y` copies, so concurrent
/// fits never share state.
struct CurveProblem {
    kind: ModelKind,
    params: Vector3<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LeastSquaresProblem<f64, Dyn, U3> for CurveProblem {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U3>;
    type ParameterStorage = Owned<f64, U3>;

    fn set_params(&mut self, p: &Vector3<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> Vector3<f64> {
        self.params
    }

    fn residuals(&self) -> Option<OVector<f64, Dyn>> {
        let n = self.x.len();
        let mut residuals = OVector::<f64, Dyn>::zeros(n);
        for i in 0..n {
            let predicted = match self.kind {
                ModelKind::Exponential => {
                    exponential(self.x[i], self.params[0], self.params[1], self.params[2])
                }
                ModelKind::Logistic => {
                    logistic(self.x[i], self.params[0], self.params[1], self.params[2])
                }
            };
            residuals[i] = self.y[i] - predicted;
        }
        Some(residuals)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U3>> {
        let n = self.x.len();
        let mut jac = OMatrix::<f64, Dyn, U3>::zeros(n);

        // Residuals are r = y - f(x), so each entry is -df/dp.
        match self.kind {
            ModelKind::Exponential => {
                let a = self.params[0];
                let k = self.params[1];
                for i in 0..n {
                    let e = (k * self.x[i]).exp();
                    jac[(i, 0)] = -e;
                    jac[(i, 1)] = -a * self.x[i] * e;
                    jac[(i, 2)] = -1.0;
                }
            }
            ModelKind::Logistic => {
                let l = self.params[0];
                let k = self.params[1];
                let x0 = self.params[2];
                for i in 0..n {
                    let s = (-k * (self.x[i] - x0)).exp();
                    let denom = 1.0 + s;
                    let denom_sq = denom * denom;
                    jac[(i, 0)] = -1.0 / denom;
                    jac[(i, 1)] = -l * (self.x[i] - x0) * s / denom_sq;
                    jac[(i, 2)] = l * k * s / denom_sq;
                }
            }
        }
        Some(jac)
    }
}

/// Fit a model to the cumulative series values.
///
/// `x` holds the integer positions aligned with `y`, in date order. The
/// returned parameters are rounded to `options.round_digits` decimals for
/// stable, reproducible output.
///
/// Fails with [`Error::EmptySeries`] when there are fewer observations than
/// the model has free parameters and with [`Error::FitDidNotConverge`] when
/// the optimizer exhausts its budget.
///
/// # Panics
/// Panics if `x` and `y` have different lengths.
pub fn fit(
    kind: ModelKind,
    x: &[f64],
    y: &[f64],
    options: &FitOptions,
) -> Result<ModelParams, Error> {
    assert_eq!(x.len(), y.len(), "x and y must be aligned");
    if x.len() < kind.param_count() {
        return Err(Error::EmptySeries {
            needed: kind.param_count(),
            got: x.len(),
        });
    }

    let problem = CurveProblem {
        kind,
        params: Vector3::new(options.guess[0], options.guess[1], options.guess[2]),
        x: x.to_vec(),
        y: y.to_vec(),
    };

    let (solved, report) = LevenbergMarquardt::new()
        .with_patience(options.patience)
        .minimize(problem);

    if !report.termination.was_successful() {
        return Err(Error::FitDidNotConverge {
            model: kind,
            reason: format!("{:?}", report.termination),
        });
    }

    let p = solved.params;
    if p.iter().any(|v| !v.is_finite()) {
        return Err(Error::FitDidNotConverge {
            model: kind,
            reason: "non-finite parameters".to_string(),
        });
    }

    let r = |v: f64| round_to(v, options.round_digits);
    Ok(match kind {
        ModelKind::Exponential => ModelParams::Exponential {
            a: r(p[0]),
            k: r(p[1]),
            b: r(p[2]),
        },
        ModelKind::Logistic => ModelParams::Logistic {
            l: r(p[0]),
            k: r(p[1]),
            x0: r(p[2]),
        },
    })
}

fn round_to(v: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}
