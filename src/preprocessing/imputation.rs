//! Median imputation for numeric columns.
//!
//! Reads named numeric columns out of a [`Table`] and fills missing (or
//! non-numeric) cells with the median observed at fit time. The result is a
//! fresh dense matrix; the source table is never modified.

use crate::dataset::Table;
use crate::error::{ChurnError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Unfitted median imputer over a set of named columns.
#[derive(Clone, Debug)]
pub struct MedianImputer {
    columns: Vec<String>,
    fallback: Option<Vec<f64>>,
}

impl MedianImputer {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            fallback: None,
        }
    }

    /// Medians to use, column by column, when the fitted data holds no
    /// numeric value for a column. Without a fallback that is a schema error.
    pub fn with_fallback(mut self, medians: Vec<f64>) -> Self {
        self.fallback = Some(medians);
        self
    }
}

/// Serializable parameters for a fitted [`MedianImputer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedianImputerParams {
    pub columns: Vec<String>,
    pub medians: Vec<f64>,
}

/// Fitted median imputer.
#[derive(Clone, Debug)]
pub struct FittedMedianImputer {
    columns: Vec<String>,
    medians: Vec<f64>,
}

impl FittedMedianImputer {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }
}

/// Median of a non-empty slice; the mean of the two middle values for even
/// lengths.
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn require_columns(table: &Table, columns: &[String]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChurnError::MissingFeature { columns: missing })
    }
}

impl Transformer for MedianImputer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = MedianImputerParams;
    type Fitted = FittedMedianImputer;

    fn fit(&self, data: &Table) -> Result<FittedMedianImputer> {
        require_columns(data, &self.columns)?;
        if let Some(fallback) = &self.fallback {
            if fallback.len() != self.columns.len() {
                return Err(ChurnError::InvalidParameter(format!(
                    "{} fallback medians for {} columns",
                    fallback.len(),
                    self.columns.len()
                )));
            }
        }

        let mut medians = Vec::with_capacity(self.columns.len());
        for (j, name) in self.columns.iter().enumerate() {
            let mut observed: Vec<f64> = data
                .column(name)
                .into_iter()
                .flatten()
                .filter_map(|v| v.as_number())
                .collect();
            let m = match (median(&mut observed), &self.fallback) {
                (Some(m), _) => m,
                (None, Some(fallback)) => {
                    tracing::debug!(column = %name, median = fallback[j], "no values observed; using fallback median");
                    fallback[j]
                }
                (None, None) => {
                    return Err(ChurnError::schema(
                        name.clone(),
                        "no numeric values to compute a median from",
                    ))
                }
            };
            medians.push(m);
        }

        Ok(FittedMedianImputer {
            columns: self.columns.clone(),
            medians,
        })
    }
}

impl FittedTransformer for FittedMedianImputer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = MedianImputerParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        require_columns(data, &self.columns)?;

        let mut out = Array2::<f64>::zeros((data.n_rows(), self.columns.len()));
        for (j, (name, &fill)) in self.columns.iter().zip(&self.medians).enumerate() {
            let Some(cells) = data.column(name) else {
                continue;
            };
            for (i, cell) in cells.enumerate() {
                out[[i, j]] = cell.as_number().unwrap_or(fill);
            }
        }
        Ok(out)
    }

    fn extract_params(&self) -> MedianImputerParams {
        MedianImputerParams {
            columns: self.columns.clone(),
            medians: self.medians.clone(),
        }
    }

    fn from_params(params: MedianImputerParams) -> Result<Self> {
        if params.columns.len() != params.medians.len() {
            return Err(ChurnError::Artifact(format!(
                "imputer has {} columns but {} medians",
                params.columns.len(),
                params.medians.len()
            )));
        }
        if let Some(i) = params.medians.iter().position(|m| !m.is_finite()) {
            return Err(ChurnError::Artifact(format!(
                "non-finite median for column `{}`",
                params.columns[i]
            )));
        }
        Ok(Self {
            columns: params.columns,
            medians: params.medians,
        })
    }

    fn n_features_out(&self) -> usize {
        self.columns.len()
    }
}
