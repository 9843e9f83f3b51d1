//! Standard Scaler (z-score normalization).
//!
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean and `s` the population standard deviation
//! (ddof = 0) over the fit data. Columns with zero spread transform to
//! exactly 0, whatever the input value.

use crate::error::{ChurnError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Population standard deviation of each feature; 0 for constant columns.
    pub std: Vec<f64>,
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl FittedStandardScaler {
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }
}

/// Spread below this (relative to the mean's magnitude) is rounding noise.
fn is_negligible(std: f64, mean: f64) -> bool {
    std <= 10.0 * f64::EPSILON * mean.abs().max(1.0)
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler> {
        if data.nrows() == 0 {
            return Err(ChurnError::InvalidParameter(
                "cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let mut mean = Vec::with_capacity(data.ncols());
        let mut std = Vec::with_capacity(data.ncols());
        for col in data.axis_iter(Axis(1)) {
            if let Some(bad) = col.iter().find(|v| !v.is_finite()) {
                return Err(ChurnError::InvalidParameter(format!(
                    "StandardScaler received non-finite value {}",
                    bad
                )));
            }
            let n = col.len() as f64;
            let m = col.sum() / n;
            let first = col[0];
            let constant = col.iter().all(|&v| v == first);
            let s = if constant {
                0.0
            } else {
                let var = col.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / n;
                let s = var.sqrt();
                if is_negligible(s, m) {
                    0.0
                } else {
                    s
                }
            };
            mean.push(if constant { first } else { m });
            std.push(s);
        }

        Ok(FittedStandardScaler { mean, std })
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(ChurnError::InvalidParameter(format!(
                "StandardScaler expected {} features, got {}",
                self.mean.len(),
                data.ncols()
            )));
        }

        let mut out = data.to_owned();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (m, s) = (self.mean[j], self.std[j]);
            if s == 0.0 {
                col.fill(0.0);
            } else {
                col.mapv_inplace(|v| (v - m) / s);
            }
        }
        Ok(out)
    }

    fn extract_params(&self) -> StandardScalerParams {
        StandardScalerParams {
            mean: self.mean.clone(),
            std: self.std.clone(),
        }
    }

    fn from_params(params: StandardScalerParams) -> Result<Self> {
        if params.mean.len() != params.std.len() {
            return Err(ChurnError::Artifact(format!(
                "scaler has {} means but {} standard deviations",
                params.mean.len(),
                params.std.len()
            )));
        }
        if params.mean.iter().any(|m| !m.is_finite())
            || params.std.iter().any(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(ChurnError::Artifact(
                "scaler statistics must be finite with non-negative spread".to_string(),
            ));
        }
        Ok(Self {
            mean: params.mean,
            std: params.std,
        })
    }

    fn n_features_out(&self) -> usize {
        self.mean.len()
    }
}
