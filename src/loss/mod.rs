use ndarray::Array1;

/// Logistic function, evaluated without overflow for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// A differentiable, twice-differentiable loss on per-row predictions.
///
/// Implementors define the per-sample value and its first and second
/// derivatives with respect to the prediction. The batch methods average
/// over rows; their gradient is what gets passed to `model.backward()`.
pub trait Loss: Send + Sync {
    /// Per-sample loss.
    fn sample_loss(&self, prediction: f64, target: f64) -> f64;

    /// Per-sample `∂L/∂pred`.
    fn sample_grad(&self, prediction: f64, target: f64) -> f64;

    /// Per-sample `∂²L/∂pred²`.
    fn sample_curvature(&self, prediction: f64, target: f64) -> f64;

    /// Upper bound on `sample_curvature` over all inputs.
    fn curvature_bound(&self) -> f64;

    /// Mean loss over the batch.
    fn loss(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> f64 {
        let n = prediction.len().max(1) as f64;
        prediction
            .iter()
            .zip(target)
            .map(|(&p, &t)| self.sample_loss(p, t))
            .sum::<f64>()
            / n
    }

    /// Gradient of the mean loss w.r.t. each prediction: `sample_grad / n`.
    fn grad_wrt_prediction(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
        let n = prediction.len().max(1) as f64;
        prediction
            .iter()
            .zip(target)
            .map(|(&p, &t)| self.sample_grad(p, t) / n)
            .collect()
    }

    /// Diagonal of the Hessian of the mean loss w.r.t. the predictions.
    fn curvature_wrt_prediction(
        &self,
        prediction: &Array1<f64>,
        target: &Array1<f64>,
    ) -> Array1<f64> {
        let n = prediction.len().max(1) as f64;
        prediction
            .iter()
            .zip(target)
            .map(|(&p, &t)| self.sample_curvature(p, t) / n)
            .collect()
    }
}

/// Binary Cross-Entropy loss with logits input (numerically stable).
///
/// Computes: `L = -(t * log(σ(z)) + (1-t) * log(1 - σ(z)))`
/// using the stable formulation: `max(z,0) - z*t + log(1 + exp(-|z|))`
///
/// Gradient w.r.t. logits: `∂L/∂z = (σ(z) - t) / n`
#[derive(Clone, Copy, Debug, Default)]
pub struct BCEWithLogitsLoss;

impl Loss for BCEWithLogitsLoss {
    fn sample_loss(&self, z: f64, t: f64) -> f64 {
        z.max(0.0) - z * t + (-z.abs()).exp().ln_1p()
    }

    fn sample_grad(&self, z: f64, t: f64) -> f64 {
        sigmoid(z) - t
    }

    fn sample_curvature(&self, z: f64, _t: f64) -> f64 {
        let s = sigmoid(z);
        s * (1.0 - s)
    }

    fn curvature_bound(&self) -> f64 {
        0.25
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_symmetry() {
        assert_eq!(sigmoid(0.0), 0.5);
        for z in [0.3, 2.0, 15.0, 700.0] {
            assert!((sigmoid(z) + sigmoid(-z) - 1.0).abs() < 1e-15);
        }
        assert!(sigmoid(-1000.0) >= 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn test_bce_with_logits_loss() {
        let logits = array![0.0, 2.0, -2.0];
        let targets = array![1.0, 1.0, 0.0];

        let bce = BCEWithLogitsLoss;
        let loss_val = bce.loss(&logits, &targets);

        // z=0,t=1: log 2 ; z=2,t=1 and z=-2,t=0: log(1 + e^-2)
        let expected = (2f64.ln() + 2.0 * (1.0 + (-2f64).exp()).ln()) / 3.0;
        assert!((loss_val - expected).abs() < 1e-12);

        let grad = bce.grad_wrt_prediction(&logits, &targets);
        let sig = [0.5, sigmoid(2.0), sigmoid(-2.0)];
        for ((g, s), t) in grad.iter().zip(sig).zip(targets.iter()) {
            assert!((g - (s - t) / 3.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_bce_numerical_stability() {
        let logits = array![100.0, -100.0, 800.0];
        let targets = array![1.0, 0.0, 0.0];

        let bce = BCEWithLogitsLoss;
        let loss_val = bce.loss(&logits, &targets);
        assert!(loss_val.is_finite());

        let grad = bce.grad_wrt_prediction(&logits, &targets);
        assert!(grad.iter().all(|x| x.is_finite()));
        let curv = bce.curvature_wrt_prediction(&logits, &targets);
        assert!(curv.iter().all(|&c| (0.0..=0.25).contains(&c)));
    }

    #[test]
    fn test_bce_curvature_peaks_at_zero() {
        assert_eq!(BCEWithLogitsLoss.sample_curvature(0.0, 1.0), 0.25);
    }
}
