use crate::error::{ChurnError, Result};
use crate::loss::sigmoid;
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2};
use std::marker::PhantomData;
use std::path::Path;

/// Weights (one per transformed feature) and bias of a logistic model.
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LogisticParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }
}

/// Plain-data form of [`LogisticParams`] for persistence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SerializableLogisticParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl From<&LogisticParams> for SerializableLogisticParams {
    fn from(params: &LogisticParams) -> Self {
        Self {
            weights: params.weights.to_vec(),
            bias: params.bias,
        }
    }
}

impl TryFrom<SerializableLogisticParams> for LogisticParams {
    type Error = ChurnError;

    fn try_from(value: SerializableLogisticParams) -> Result<Self> {
        if !value.bias.is_finite() || value.weights.iter().any(|w| !w.is_finite()) {
            return Err(ChurnError::Artifact(
                "classifier weights must be finite".to_string(),
            ));
        }
        Ok(Self {
            weights: Array1::from(value.weights),
            bias: value.bias,
        })
    }
}

impl ParamOps for LogisticParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, scalar: f64) -> Self {
        Self {
            weights: &self.weights * scalar,
            bias: self.bias * scalar,
        }
    }

    fn max_abs(&self) -> f64 {
        self.weights
            .iter()
            .fold(self.bias.abs(), |acc, w| acc.max(w.abs()))
    }
}

/// Binary logistic regression: `p = σ(w·x + b)`.
#[derive(Clone, Debug)]
pub struct LogisticModel<S> {
    params: LogisticParams,
    _state: PhantomData<S>,
}

impl<S> LogisticModel<S> {
    pub fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    /// Raw scores `w·x + b`, one per row.
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params.weights) + self.params.bias
    }
}

impl LogisticModel<Fitted> {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.params.weights
    }

    pub fn bias(&self) -> f64 {
        self.params.bias
    }

    /// Class labels: 1 iff the probability is at least 0.5.
    pub fn predict_labels(&self, x: &Array2<f64>) -> Vec<u8> {
        self.predict_batch(x)
            .iter()
            .map(|&p| u8::from(p >= 0.5))
            .collect()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| ChurnError::Artifact(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let params = SerializableLogisticParams::from_bytes(&bytes)
            .map_err(|e| ChurnError::Artifact(e.to_string()))?;
        Self::from_params(params)
    }
}

impl InferenceModel for LogisticModel<Fitted> {
    type InputSingle = [f64];
    type OutputSingle = f64;
    type InputBatch = Array2<f64>;
    type OutputBatch = Array1<f64>;
    type ParamsRepr = SerializableLogisticParams;

    /// Probability of the positive class for one feature vector.
    fn predict(&self, input: &[f64]) -> f64 {
        let z = self
            .params
            .weights
            .iter()
            .zip(input)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.params.bias;
        sigmoid(z)
    }

    /// Positive-class probabilities, one per row.
    fn predict_batch(&self, input: &Array2<f64>) -> Array1<f64> {
        self.decision_function(input).mapv(sigmoid)
    }

    fn extract_params(&self) -> SerializableLogisticParams {
        (&self.params).into()
    }

    fn from_params(params: SerializableLogisticParams) -> Result<Self> {
        Ok(Self::new(LogisticParams::try_from(params)?))
    }
}

impl TrainableModel for LogisticModel<Unfitted> {
    type Input = Array2<f64>;
    type Prediction = Array1<f64>;
    type Params = LogisticParams;
    type Gradients = LogisticParams;
    type Output = LogisticModel<Fitted>;

    /// Logits for every row.
    fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        self.decision_function(x)
    }

    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> LogisticParams {
        LogisticParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn params(&self) -> &LogisticParams {
        &self.params
    }

    fn update_params(&mut self, params: &LogisticParams) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LogisticModel<Fitted> {
        LogisticModel::<Fitted>::new(self.params)
    }
}

pub type LogisticRegression = LogisticModel<Unfitted>;

impl LogisticRegression {
    /// A model with all weights and the bias at zero.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(LogisticParams::zeros(n_features))
    }

    pub fn from_params(params: LogisticParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

/// A trained logistic regression.
pub type LogisticRegressor = LogisticModel<Fitted>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted() -> LogisticRegressor {
        LogisticRegressor::new(LogisticParams {
            weights: array![2.0, -1.0],
            bias: 0.5,
        })
    }

    #[test]
    fn test_predict_matches_batch() {
        let model = fitted();
        let x = array![[1.0, 0.0], [0.0, 3.0]];
        let batch = model.predict_batch(&x);
        assert_eq!(batch[0], model.predict(&[1.0, 0.0]));
        assert_eq!(batch[1], model.predict(&[0.0, 3.0]));
        assert!((batch[0] - sigmoid(2.5)).abs() < 1e-15);
    }

    #[test]
    fn test_predict_labels_threshold() {
        let model = LogisticRegressor::new(LogisticParams {
            weights: array![1.0],
            bias: 0.0,
        });
        // p(0) = 0.5 exactly, which is labelled 1.
        let x = array![[0.0], [-1.0], [1.0]];
        assert_eq!(model.predict_labels(&x), vec![1, 0, 1]);
    }

    #[test]
    fn test_backward_is_xt_times_grad() {
        let model = LogisticRegression::new(2);
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let grads = model.backward(&x, &array![1.0, -1.0]);
        assert_eq!(grads.weights, array![-2.0, -2.0]);
        assert_eq!(grads.bias, 0.0);
    }

    #[test]
    fn test_param_ops() {
        let a = LogisticParams {
            weights: array![1.0, -3.0],
            bias: 2.0,
        };
        let b = a.scale(-2.0).add(&a);
        assert_eq!(b.weights, array![-1.0, 3.0]);
        assert_eq!(b.bias, -2.0);
        assert_eq!(a.max_abs(), 3.0);
    }

    #[test]
    fn test_logistic_model_save_load() -> Result<()> {
        let model = fitted();

        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("model.bin");
        model.save_to_file(&path)?;
        let loaded = LogisticRegressor::load_from_file(&path)?;

        assert_eq!(model.extract_params(), loaded.extract_params());
        Ok(())
    }

    #[test]
    fn test_from_params_rejects_nan() {
        let params = SerializableLogisticParams {
            weights: vec![f64::NAN],
            bias: 0.0,
        };
        assert!(matches!(
            LogisticRegressor::from_params(params),
            Err(ChurnError::Artifact(_))
        ));
    }
}
