//! Solvers for the regularized logistic objective.
//!
//! A [`Problem`] bundles the training matrix, targets, loss and regularizer
//! and exposes the objective and its gradient in terms of the model's own
//! `forward`/`backward`. Each solver implements [`Optimizer`] and mutates an
//! unfitted model's parameters in place until its tolerance is met or its
//! iteration budget runs out.

pub mod newton;
pub mod saga;

pub use newton::Newton;
pub use saga::Saga;

use crate::loss::Loss;
use crate::model::{LogisticParams, LogisticRegression, ParamOps, TrainableModel};
use crate::regularizers::Regularizer;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Solver variant, the second axis of the hyperparameter grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// Newton-Raphson with backtracking line search.
    Newton,
    /// SAGA incremental gradient with a seeded sample order.
    Saga,
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Newton => "newton",
            Solver::Saga => "saga",
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one solver run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
    /// Objective value at the final parameters.
    pub objective: f64,
}

/// Training data plus the objective `mean loss + penalty`.
pub struct Problem<'a, L: Loss, R: Regularizer> {
    pub x: &'a Array2<f64>,
    pub y: &'a Array1<f64>,
    pub loss: &'a L,
    pub regularizer: &'a R,
}

impl<'a, L: Loss, R: Regularizer> Problem<'a, L, R> {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Objective value at the model's current parameters.
    pub fn objective(&self, model: &LogisticRegression) -> f64 {
        let preds = model.forward(self.x);
        let (penalty, _) = self
            .regularizer
            .regularizer_penalty_grad(model.params(), self.n_samples());
        self.loss.loss(&preds, self.y) + penalty
    }

    /// Objective value and gradient at the model's current parameters.
    pub fn objective_grad(&self, model: &LogisticRegression) -> (f64, LogisticParams) {
        let preds = model.forward(self.x);
        let (penalty, reg_grad) = self
            .regularizer
            .regularizer_penalty_grad(model.params(), self.n_samples());
        let value = self.loss.loss(&preds, self.y) + penalty;
        let grad_preds = self.loss.grad_wrt_prediction(&preds, self.y);
        let grads = model.backward(self.x, &grad_preds);
        (value, grads.add(&reg_grad))
    }
}

/// A solver that minimizes a [`Problem`] starting from the model's current
/// parameters.
pub trait Optimizer: Send + Sync {
    /// Name used in logs and convergence errors.
    fn name(&self) -> &'static str;

    fn minimize<L: Loss, R: Regularizer>(
        &self,
        model: &mut LogisticRegression,
        problem: &Problem<'_, L, R>,
    ) -> SolveReport;
}

/// A [`Solver`] variant with its iteration budget applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfiguredSolver {
    Newton(Newton),
    Saga(Saga),
}

impl ConfiguredSolver {
    pub fn new(solver: Solver, max_iter: usize, tol: f64, seed: u64) -> Self {
        match solver {
            Solver::Newton => ConfiguredSolver::Newton(Newton::new(max_iter, tol)),
            Solver::Saga => ConfiguredSolver::Saga(Saga::new(max_iter, tol, seed)),
        }
    }
}

impl Optimizer for ConfiguredSolver {
    fn name(&self) -> &'static str {
        match self {
            ConfiguredSolver::Newton(o) => o.name(),
            ConfiguredSolver::Saga(o) => o.name(),
        }
    }

    fn minimize<L: Loss, R: Regularizer>(
        &self,
        model: &mut LogisticRegression,
        problem: &Problem<'_, L, R>,
    ) -> SolveReport {
        match self {
            ConfiguredSolver::Newton(o) => o.minimize(model, problem),
            ConfiguredSolver::Saga(o) => o.minimize(model, problem),
        }
    }
}
