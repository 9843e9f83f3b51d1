//! Fitting a logistic model: a loss, a regularizer and a solver bound
//! together, with convergence failures surfaced as errors.

use crate::config::SolverConfig;
use crate::error::{ChurnError, Result};
use crate::loss::{BCEWithLogitsLoss, Loss};
use crate::model::{LogisticModel, LogisticRegression, TrainableModel, Fitted};
use crate::optimizer::{ConfiguredSolver, Optimizer, Problem, Solver};
use crate::regularizers::{Regularizer, L2};
use ndarray::{Array1, Array2};

/// Immutable training setup. Build one with [`Trainer::builder`].
#[derive(Clone, Debug)]
pub struct Trainer<L, O, R>
where
    L: Loss,
    O: Optimizer,
    R: Regularizer,
{
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
}

/// Fluent builder for the logistic trainer used by the pipeline.
#[derive(Clone, Debug)]
pub struct TrainerBuilder {
    solver: Solver,
    c: f64,
    max_iter: usize,
    tol: f64,
    seed: u64,
}

impl TrainerBuilder {
    pub fn new(solver: Solver, c: f64) -> Self {
        let defaults = SolverConfig::default();
        Self {
            solver,
            c,
            max_iter: defaults.max_iter,
            tol: defaults.tol,
            seed: defaults.seed,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Take budget, tolerance and seed from a [`SolverConfig`].
    pub fn config(self, config: &SolverConfig) -> Self {
        self.max_iter(config.max_iter).tol(config.tol).seed(config.seed)
    }

    pub fn build(self) -> Result<Trainer<BCEWithLogitsLoss, ConfiguredSolver, L2>> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ChurnError::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        Ok(Trainer::new(
            BCEWithLogitsLoss,
            ConfiguredSolver::new(self.solver, self.max_iter, self.tol, self.seed),
            L2::new(self.c),
        ))
    }
}

impl<L, O, R> Trainer<L, O, R>
where
    L: Loss,
    O: Optimizer,
    R: Regularizer,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            loss_fn,
            optimizer,
            regularizer,
        }
    }

    /// Minimize the regularized loss starting from `model`'s parameters.
    ///
    /// # Errors
    /// - [`ChurnError::InvalidParameter`] on empty or misshapen input.
    /// - [`ChurnError::Convergence`] when the solver exhausts its budget
    ///   before meeting its tolerance.
    pub fn fit(
        &self,
        mut model: LogisticRegression,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<LogisticModel<Fitted>> {
        if x.nrows() == 0 {
            return Err(ChurnError::InvalidParameter("training matrix is empty".into()));
        }
        if x.nrows() != y.len() || x.ncols() != model.n_features() {
            return Err(ChurnError::InvalidParameter(format!(
                "shape mismatch: {}x{} matrix, {} targets, model with {} features",
                x.nrows(),
                x.ncols(),
                y.len(),
                model.n_features()
            )));
        }

        let problem = Problem {
            x,
            y,
            loss: &self.loss_fn,
            regularizer: &self.regularizer,
        };
        let report = self.optimizer.minimize(&mut model, &problem);

        if !report.converged {
            return Err(ChurnError::Convergence {
                solver: self.optimizer.name().to_string(),
                c: self.regularizer.strength(),
                iterations: report.iterations,
            });
        }

        tracing::debug!(
            solver = self.optimizer.name(),
            c = self.regularizer.strength(),
            iterations = report.iterations,
            objective = report.objective,
            "solver converged"
        );
        Ok(model.into_fitted())
    }
}

impl Trainer<BCEWithLogitsLoss, ConfiguredSolver, L2> {
    pub fn builder(solver: Solver, c: f64) -> TrainerBuilder {
        TrainerBuilder::new(solver, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InferenceModel;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[-1.0], [-0.5], [0.2], [0.4], [1.1], [-0.2]];
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_trainer_fit_both_solvers() {
        let (x, y) = data();
        for solver in [Solver::Newton, Solver::Saga] {
            let trainer = Trainer::builder(solver, 1.0).build().unwrap();
            let fitted = trainer.fit(LogisticRegression::new(1), &x, &y).unwrap();
            assert!(fitted.weights()[0] > 0.0, "{} weight", solver);
            let p = fitted.predict_batch(&x);
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_trainer_convergence_error() {
        let (x, y) = data();
        let trainer = Trainer::builder(Solver::Newton, 10.0)
            .max_iter(1)
            .tol(1e-300)
            .build()
            .unwrap();
        let result = trainer.fit(LogisticRegression::new(1), &x, &y);
        assert!(matches!(
            result,
            Err(ChurnError::Convergence { ref solver, c, .. }) if solver == "newton" && c == 10.0
        ));
    }

    #[test]
    fn test_trainer_rejects_bad_c() {
        assert!(Trainer::builder(Solver::Saga, 0.0).build().is_err());
        assert!(Trainer::builder(Solver::Saga, f64::NAN).build().is_err());
    }

    #[test]
    fn test_trainer_shape_mismatch() {
        let (x, y) = data();
        let trainer = Trainer::builder(Solver::Newton, 1.0).build().unwrap();
        assert!(matches!(
            trainer.fit(LogisticRegression::new(3), &x, &y),
            Err(ChurnError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_trainer_config() {
        let cfg = SolverConfig {
            max_iter: 5,
            tol: 0.5,
            seed: 9,
        };
        let trainer = Trainer::builder(Solver::Saga, 1.0).config(&cfg).build().unwrap();
        assert_eq!(trainer.optimizer, ConfiguredSolver::new(Solver::Saga, 5, 0.5, 9));
    }
}
