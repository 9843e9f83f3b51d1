use crate::loss::Loss;
use crate::model::{LogisticParams, LogisticRegression, ParamOps, TrainableModel};
use crate::optimizer::{Optimizer, Problem, SolveReport, Solver};
use crate::regularizers::Regularizer;
use ndarray::{s, Array1, Array2, Axis};

/// Sufficient-decrease constant for the Armijo line search.
const ARMIJO: f64 = 1e-4;
const MAX_HALVINGS: usize = 40;
/// Relative diagonal shifts tried when the Hessian is not numerically
/// positive definite.
const JITTER: [f64; 5] = [0.0, 1e-12, 1e-10, 1e-8, 1e-6];

/// Newton-Raphson solver.
///
/// Each iteration solves `H Δ = g` over the joint `(weights, bias)` vector
/// by Cholesky factorization and takes the largest step `t ∈ {1, ½, ¼, …}`
/// satisfying the Armijo condition. Converged when the largest absolute
/// gradient component is at most `tol`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Newton {
    max_iter: usize,
    tol: f64,
}

impl Newton {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self { max_iter, tol }
    }
}

impl Default for Newton {
    fn default() -> Self {
        Self::new(1000, 1e-4)
    }
}

impl Optimizer for Newton {
    fn name(&self) -> &'static str {
        Solver::Newton.name()
    }

    fn minimize<L: Loss, R: Regularizer>(
        &self,
        model: &mut LogisticRegression,
        problem: &Problem<'_, L, R>,
    ) -> SolveReport {
        let mut iterations = 0;
        loop {
            let (value, grad) = problem.objective_grad(model);
            if grad.max_abs() <= self.tol {
                return SolveReport {
                    iterations,
                    converged: true,
                    objective: value,
                };
            }
            if iterations >= self.max_iter {
                return SolveReport {
                    iterations,
                    converged: false,
                    objective: value,
                };
            }

            let hessian = hessian(model, problem);
            let g = flatten(&grad);
            let delta = JITTER
                .iter()
                .find_map(|&jitter| cholesky_solve(&shifted(&hessian, jitter), &g))
                .unwrap_or_else(|| g.clone());
            let slope = g.dot(&delta);
            let step = unflatten(&delta);

            let current = model.params().clone();
            let mut t = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_HALVINGS {
                let candidate = current.add(&step.scale(-t));
                model.update_params(&candidate);
                if problem.objective(model) <= value - ARMIJO * t * slope {
                    accepted = true;
                    break;
                }
                t *= 0.5;
            }
            if !accepted {
                model.update_params(&current);
                tracing::debug!(iterations, objective = value, "newton line search stalled");
                return SolveReport {
                    iterations,
                    converged: false,
                    objective: value,
                };
            }
            iterations += 1;
        }
    }
}

/// Hessian of the objective over `(weights, bias)`, bias last.
fn hessian<L: Loss, R: Regularizer>(
    model: &LogisticRegression,
    problem: &Problem<'_, L, R>,
) -> Array2<f64> {
    let p = problem.n_features();
    let preds = model.forward(problem.x);
    let curv = problem.loss.curvature_wrt_prediction(&preds, problem.y);
    let weighted = problem.x * &curv.view().insert_axis(Axis(1));

    let mut h = Array2::<f64>::zeros((p + 1, p + 1));
    h.slice_mut(s![..p, ..p]).assign(&problem.x.t().dot(&weighted));
    let lambda = problem.regularizer.curvature(problem.n_samples());
    for j in 0..p {
        h[[j, j]] += lambda;
    }
    let cross = weighted.sum_axis(Axis(0));
    h.slice_mut(s![..p, p]).assign(&cross);
    h.slice_mut(s![p, ..p]).assign(&cross);
    h[[p, p]] = curv.sum();
    h
}

fn shifted(h: &Array2<f64>, jitter: f64) -> Array2<f64> {
    if jitter == 0.0 {
        return h.clone();
    }
    let scale = h.diag().iter().fold(1.0_f64, |acc, d| acc.max(d.abs()));
    let mut out = h.clone();
    out.diag_mut().mapv_inplace(|d| d + jitter * scale);
    out
}

fn flatten(params: &LogisticParams) -> Array1<f64> {
    params
        .weights
        .iter()
        .copied()
        .chain(std::iter::once(params.bias))
        .collect()
}

fn unflatten(v: &Array1<f64>) -> LogisticParams {
    let p = v.len() - 1;
    LogisticParams {
        weights: v.slice(s![..p]).to_owned(),
        bias: v[p],
    }
}

/// Solve `A x = b` for symmetric positive definite `A`. `None` when a pivot
/// is not strictly positive.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > 0.0 && sum.is_finite()) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::BCEWithLogitsLoss;
    use crate::regularizers::L2;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [-1.2, 0.4],
            [-0.8, -0.3],
            [-0.1, 1.0],
            [0.3, -1.1],
            [0.9, 0.2],
            [1.5, 0.7],
        ];
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let back = a.dot(&x);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(cholesky_solve(&a, &array![1.0, 1.0]).is_none());
    }

    #[test]
    fn test_newton_converges() {
        let (x, y) = data();
        let problem = Problem {
            x: &x,
            y: &y,
            loss: &BCEWithLogitsLoss,
            regularizer: &L2::new(1.0),
        };
        let mut model = LogisticRegression::new(2);
        let report = Newton::default().minimize(&mut model, &problem);

        assert!(report.converged);
        assert!(report.iterations < 20);
        let (_, grad) = problem.objective_grad(&model);
        assert!(grad.max_abs() <= 1e-4);
        assert!(model.params().weights[0] > 0.0);
    }

    #[test]
    fn test_newton_budget_exhausted() {
        let (x, y) = data();
        let problem = Problem {
            x: &x,
            y: &y,
            loss: &BCEWithLogitsLoss,
            regularizer: &L2::new(1.0),
        };
        let mut model = LogisticRegression::new(2);
        let report = Newton::new(0, 1e-12).minimize(&mut model, &problem);
        assert!(!report.converged);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_newton_is_deterministic() {
        let (x, y) = data();
        let problem = Problem {
            x: &x,
            y: &y,
            loss: &BCEWithLogitsLoss,
            regularizer: &L2::new(0.1),
        };
        let mut a = LogisticRegression::new(2);
        let mut b = LogisticRegression::new(2);
        Newton::default().minimize(&mut a, &problem);
        Newton::default().minimize(&mut b, &problem);
        assert_eq!(a.params(), b.params());
    }
}
