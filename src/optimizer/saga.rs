use crate::loss::Loss;
use crate::model::{LogisticRegression, ParamOps, TrainableModel};
use crate::optimizer::{Optimizer, Problem, SolveReport, Solver};
use crate::regularizers::Regularizer;
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// SAGA incremental-gradient solver.
///
/// Keeps one stored loss derivative per sample and their running average;
/// each step samples a row (ChaCha8, seeded), corrects the averaged gradient
/// with that row's fresh derivative and applies the penalty gradient.
/// Step size is `1 / (3L)` with `L` the largest per-sample smoothness
/// constant. One iteration is one pass of `n` steps; converged when the
/// largest parameter change over a pass is at most `tol` times the largest
/// parameter magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Saga {
    max_iter: usize,
    tol: f64,
    seed: u64,
}

impl Saga {
    pub fn new(max_iter: usize, tol: f64, seed: u64) -> Self {
        Self {
            max_iter,
            tol,
            seed,
        }
    }
}

impl Default for Saga {
    fn default() -> Self {
        Self::new(1000, 1e-4, 42)
    }
}

impl Optimizer for Saga {
    fn name(&self) -> &'static str {
        Solver::Saga.name()
    }

    fn minimize<L: Loss, R: Regularizer>(
        &self,
        model: &mut LogisticRegression,
        problem: &Problem<'_, L, R>,
    ) -> SolveReport {
        let n = problem.n_samples();
        if n == 0 {
            return SolveReport {
                iterations: 0,
                converged: true,
                objective: problem.objective(model),
            };
        }

        let max_sq_norm = problem
            .x
            .rows()
            .into_iter()
            .map(|row| row.dot(&row) + 1.0)
            .fold(0.0_f64, f64::max);
        let smoothness =
            problem.loss.curvature_bound() * max_sq_norm + problem.regularizer.curvature(n);
        let step = 1.0 / (3.0 * smoothness);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut memory = vec![0.0_f64; n];
        let mut avg_w = Array1::<f64>::zeros(problem.n_features());
        let mut avg_b = 0.0_f64;
        let mut params = model.params().clone();

        for epoch in 0..self.max_iter {
            let before = params.clone();
            for _ in 0..n {
                let i = rng.gen_range(0..n);
                let xi = problem.x.row(i);
                let z = xi.dot(&params.weights) + params.bias;
                let g = problem.loss.sample_grad(z, problem.y[i]);
                let diff = g - memory[i];
                let (_, reg) = problem.regularizer.regularizer_penalty_grad(&params, n);

                params.weights.scaled_add(-step * diff, &xi);
                params.weights.scaled_add(-step, &avg_w);
                params.weights.scaled_add(-step, &reg.weights);
                params.bias -= step * (diff + avg_b + reg.bias);

                avg_w.scaled_add(diff / n as f64, &xi);
                avg_b += diff / n as f64;
                memory[i] = g;
            }

            let max_change = params.add(&before.scale(-1.0)).max_abs();
            let max_weight = params.max_abs();
            let converged = if max_weight == 0.0 {
                max_change == 0.0
            } else {
                max_change <= self.tol * max_weight
            };
            if converged {
                model.update_params(&params);
                return SolveReport {
                    iterations: epoch + 1,
                    converged: true,
                    objective: problem.objective(model),
                };
            }
        }

        model.update_params(&params);
        SolveReport {
            iterations: self.max_iter,
            converged: false,
            objective: problem.objective(model),
        }
    }
}
