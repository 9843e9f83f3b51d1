//! Models and the traits that connect them to training and inference.

pub mod logistic;
pub mod state;

pub use logistic::{
    LogisticModel, LogisticParams, LogisticRegression, LogisticRegressor,
    SerializableLogisticParams,
};
pub use state::{Fitted, Unfitted};

use crate::error::Result;

/// A model that can be optimized: forward pass, gradient of the loss with
/// respect to its parameters, and conversion into its fitted form.
pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Vector-space operations on a parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;
    /// Largest absolute component.
    fn max_abs(&self) -> f64;
}

/// A trained model usable for prediction and persistence.
pub trait InferenceModel {
    type InputSingle: ?Sized;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    type ParamsRepr;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;

    fn extract_params(&self) -> Self::ParamsRepr;
    fn from_params(params: Self::ParamsRepr) -> Result<Self>
    where
        Self: Sized;
}
