//! Schema-driven preprocessor.
//!
//! Applies median imputation then standardization to the numeric columns and
//! one-hot encoding to the categorical columns, and concatenates the results:
//! numeric block first, in schema order, then one block per categorical
//! column.

use crate::dataset::Table;
use crate::error::{ChurnError, Result};
use crate::preprocessing::imputation::{FittedMedianImputer, MedianImputer, MedianImputerParams};
use crate::preprocessing::one_hot::{
    CategoricalColumnParams, FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams,
};
use crate::preprocessing::standard::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::schema::FeatureSchema;
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Unfitted preprocessor bound to a feature schema.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    schema: FeatureSchema,
    fallback_medians: Option<Vec<f64>>,
}

impl Preprocessor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            fallback_medians: None,
        }
    }

    /// Medians, in numeric schema order, for columns with no observed value
    /// in the data being fitted. Used for cross-validation folds.
    pub fn with_fallback_medians(mut self, medians: Vec<f64>) -> Self {
        self.fallback_medians = Some(medians);
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

/// Learned statistics for one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericColumnParams {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub std: f64,
}

/// Serializable parameters for a [`FittedPreprocessor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorParams {
    pub numeric: Vec<NumericColumnParams>,
    pub categorical: Vec<CategoricalColumnParams>,
}

/// Fitted preprocessor: immutable once built, safe to share across threads.
#[derive(Clone, Debug)]
pub struct FittedPreprocessor {
    imputer: FittedMedianImputer,
    scaler: FittedStandardScaler,
    encoder: FittedOneHotEncoder,
}

impl FittedPreprocessor {
    /// Names of the output features, in matrix column order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.imputer.columns().to_vec();
        names.extend(self.encoder.feature_names());
        names
    }

    pub fn numeric_columns(&self) -> &[String] {
        self.imputer.columns()
    }

    fn numeric_block(&self, data: &Table) -> Result<Array2<f64>> {
        let imputed = self.imputer.transform(data)?;
        self.scaler.transform(&imputed)
    }
}

impl Transformer for Preprocessor {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = PreprocessorParams;
    type Fitted = FittedPreprocessor;

    fn fit(&self, data: &Table) -> Result<FittedPreprocessor> {
        let missing = self.schema.missing_numeric(data);
        if !missing.is_empty() {
            return Err(ChurnError::MissingFeature { columns: missing });
        }

        let mut imputer = MedianImputer::new(self.schema.numeric().to_vec());
        if let Some(fallback) = &self.fallback_medians {
            imputer = imputer.with_fallback(fallback.clone());
        }
        let imputer = imputer.fit(data)?;
        let imputed = imputer.transform(data)?;
        let scaler = StandardScaler::new().fit(&imputed)?;
        let encoder = OneHotEncoder::new(self.schema.categorical().to_vec()).fit(data)?;

        Ok(FittedPreprocessor {
            imputer,
            scaler,
            encoder,
        })
    }
}

impl FittedTransformer for FittedPreprocessor {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = PreprocessorParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let missing: Vec<String> = self
            .imputer
            .columns()
            .iter()
            .filter(|c| !data.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ChurnError::MissingFeature { columns: missing });
        }

        let numeric = self.numeric_block(data)?;
        let categorical = self.encoder.transform(data)?;
        concatenate(Axis(1), &[numeric.view(), categorical.view()])
            .map_err(|e| ChurnError::InvalidParameter(format!("feature concatenation failed: {}", e)))
    }

    fn extract_params(&self) -> PreprocessorParams {
        let imputer = self.imputer.extract_params();
        let scaler = self.scaler.extract_params();
        let numeric = imputer
            .columns
            .into_iter()
            .zip(imputer.medians)
            .zip(scaler.mean.into_iter().zip(scaler.std))
            .map(|((name, median), (mean, std))| NumericColumnParams {
                name,
                median,
                mean,
                std,
            })
            .collect();
        PreprocessorParams {
            numeric,
            categorical: self.encoder.extract_params().columns,
        }
    }

    fn from_params(params: PreprocessorParams) -> Result<Self> {
        let n = params.numeric.len();
        let mut imputer = MedianImputerParams {
            columns: Vec::with_capacity(n),
            medians: Vec::with_capacity(n),
        };
        let mut scaler = StandardScalerParams {
            mean: Vec::with_capacity(n),
            std: Vec::with_capacity(n),
        };
        for col in params.numeric {
            imputer.columns.push(col.name);
            imputer.medians.push(col.median);
            scaler.mean.push(col.mean);
            scaler.std.push(col.std);
        }

        Ok(Self {
            imputer: FittedMedianImputer::from_params(imputer)?,
            scaler: FittedStandardScaler::from_params(scaler)?,
            encoder: FittedOneHotEncoder::from_params(OneHotEncoderParams {
                columns: params.categorical,
            })?,
        })
    }

    fn n_features_out(&self) -> usize {
        self.scaler.n_features_out() + self.encoder.n_features_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{read_csv, Value};

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec!["x1".into(), "x2".into()],
            vec!["cat".into()],
            "Churn",
        )
        .unwrap()
    }

    fn train() -> Table {
        read_csv("x1,x2,cat,Churn\n10,100,A,Yes\n20,200,B,No\n30,300,A,Yes\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_preprocessor_layout() {
        let fitted = Preprocessor::new(schema()).fit(&train()).unwrap();
        assert_eq!(fitted.n_features_out(), 4);
        assert_eq!(fitted.feature_names(), vec!["x1", "x2", "cat=A", "cat=B"]);

        let out = fitted.transform(&train()).unwrap();
        assert_eq!(out.shape(), &[3, 4]);
        assert_eq!(out[[1, 0]], 0.0);
        assert!(out[[0, 0]] < 0.0 && out[[2, 0]] > 0.0);
        assert_eq!(out.row(1).slice(ndarray::s![2..]).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_preprocessor_unknown_category() {
        let fitted = Preprocessor::new(schema()).fit(&train()).unwrap();
        let test = read_csv("x1,x2,cat\n20,200,C\n".as_bytes()).unwrap();
        let out = fitted.transform(&test).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_preprocessor_missing_numeric_column() {
        let fitted = Preprocessor::new(schema()).fit(&train()).unwrap();
        let test = read_csv("x1,cat\n20,A\n".as_bytes()).unwrap();
        assert!(matches!(
            fitted.transform(&test),
            Err(ChurnError::MissingFeature { columns }) if columns == vec!["x2".to_string()]
        ));
    }

    #[test]
    fn test_preprocessor_imputes_missing_cell() {
        let fitted = Preprocessor::new(schema()).fit(&train()).unwrap();
        let test = read_csv("x1,x2,cat\n,200,A\n".as_bytes()).unwrap();
        let out = fitted.transform(&test).unwrap();
        // Median of x1 is 20, which is also the mean.
        assert_eq!(out[[0, 0]], 0.0);
    }

    #[test]
    fn test_preprocessor_does_not_mutate_input() {
        let table = read_csv("x1,x2,cat,Churn\n,100,A,Yes\n20,200,B,No\n".as_bytes()).unwrap();
        let before = table.clone();
        Preprocessor::new(schema()).fit_transform(&table).unwrap();
        assert_eq!(table, before);
        assert_eq!(table.get(0, "x1"), Some(&Value::Missing));
    }

    #[test]
    fn test_preprocessor_params_roundtrip_is_exact() {
        let fitted = Preprocessor::new(schema()).fit(&train()).unwrap();
        let params = fitted.extract_params();
        assert_eq!(params.numeric[0].median, 20.0);
        assert_eq!(params.categorical[0].categories, vec!["A", "B"]);

        let restored = FittedPreprocessor::from_params(params.clone()).unwrap();
        assert_eq!(restored.extract_params(), params);
        assert_eq!(
            restored.transform(&train()).unwrap(),
            fitted.transform(&train()).unwrap()
        );
    }
}
