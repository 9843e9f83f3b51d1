//! Core traits for preprocessing transformers.
//!
//! - [`Transformer`]: the unfitted, configurable form; learns from data.
//! - [`FittedTransformer`]: the fitted form; transforms data and round-trips
//!   through a plain-data parameter struct.

use crate::error::{ChurnError, Result};
use crate::serialization::SerializableParams;

/// An unfitted transformer.
///
/// # Example
/// ```ignore
/// use churnkit::preprocessing::{StandardScaler, Transformer, FittedTransformer};
///
/// let fitted = StandardScaler::new().fit(&train)?;
/// let scaled = fitted.transform(&test)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type.
    type Input: ?Sized;
    /// Output data type.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type.
    type Fitted: FittedTransformer<Input = Self::Input, Output = Self::Output, Params = Self::Params>;

    /// Learn parameters from `data`.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted>;

    /// Fit on `data` and transform it in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// A fitted transformer ready for inference.
///
/// # Guarantees
/// - `extract_params()` followed by `from_params()` reproduces a transformer
///   with bit-identical output.
/// - `transform` never mutates its input.
pub trait FittedTransformer: Clone + Send + Sync {
    type Input: ?Sized;
    type Output;
    type Params: SerializableParams;

    /// Transform data using the learned parameters.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output>;

    /// Extract learned parameters as plain data.
    fn extract_params(&self) -> Self::Params;

    /// Rebuild a fitted transformer from parameters, validating them.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Number of output columns produced by `transform`.
    fn n_features_out(&self) -> usize;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| ChurnError::Artifact(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params =
            Self::Params::from_bytes(&bytes).map_err(|e| ChurnError::Artifact(e.to_string()))?;
        Self::from_params(params)
    }
}
