use crate::model::LogisticParams;

/// Penalty on model parameters added to the mean loss.
pub trait Regularizer: Send + Sync {
    /// Penalty value and its gradient for a problem with `n_samples` rows.
    fn regularizer_penalty_grad(&self, params: &LogisticParams, n_samples: usize)
        -> (f64, LogisticParams);

    /// Constant diagonal Hessian contribution on each weight.
    fn curvature(&self, n_samples: usize) -> f64;

    /// Inverse regularization strength `C`, reported in diagnostics.
    fn strength(&self) -> f64;
}

/// L2 penalty in inverse-strength form: `‖w‖² / (2·C·n)`. The bias is not
/// penalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct L2 {
    c: f64,
}

impl L2 {
    pub fn new(c: f64) -> Self {
        Self { c }
    }

    fn lambda(&self, n_samples: usize) -> f64 {
        1.0 / (self.c * n_samples.max(1) as f64)
    }
}

impl Regularizer for L2 {
    fn regularizer_penalty_grad(
        &self,
        params: &LogisticParams,
        n_samples: usize,
    ) -> (f64, LogisticParams) {
        let lambda = self.lambda(n_samples);
        let penalty = 0.5 * lambda * params.weights.dot(&params.weights);
        let grad = LogisticParams {
            weights: &params.weights * lambda,
            bias: 0.0,
        };
        (penalty, grad)
    }

    fn curvature(&self, n_samples: usize) -> f64 {
        self.lambda(n_samples)
    }

    fn strength(&self) -> f64 {
        self.c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_l2_penalty_and_grad() {
        let params = LogisticParams {
            weights: array![1.0, -2.0],
            bias: 10.0,
        };
        let (penalty, grad) = L2::new(0.5).regularizer_penalty_grad(&params, 4);
        // ‖w‖² = 5, 2·C·n = 4
        assert!((penalty - 1.25).abs() < 1e-15);
        assert_eq!(grad.weights, array![0.5, -1.0]);
        assert_eq!(grad.bias, 0.0);
    }

    #[test]
    fn test_l2_curvature() {
        assert_eq!(L2::new(2.0).curvature(5), 0.1);
    }
}
