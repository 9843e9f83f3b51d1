//! One-hot encoding for categorical columns.
//!
//! Each column contributes one output feature per category seen at fit time
//! (sorted). A value not seen at fit time, a missing cell, or an entirely
//! absent column encodes as the all-zero vector of that column's width.

use crate::dataset::Table;
use crate::error::{ChurnError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One-hot encoder for categorical columns (unfitted).
#[derive(Clone, Debug)]
pub struct OneHotEncoder {
    columns: Vec<String>,
}

impl OneHotEncoder {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

/// Categories learned for one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumnParams {
    pub name: String,
    pub categories: Vec<String>,
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    pub columns: Vec<CategoricalColumnParams>,
}

#[derive(Clone, Debug)]
struct EncodedColumn {
    name: String,
    categories: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl EncodedColumn {
    fn new(name: String, categories: Vec<String>) -> Result<Self> {
        let lookup: HashMap<String, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        if lookup.len() != categories.len() {
            return Err(ChurnError::Artifact(format!(
                "duplicate category in column `{}`",
                name
            )));
        }
        Ok(Self {
            name,
            categories,
            lookup,
        })
    }
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    columns: Vec<EncodedColumn>,
    n_features_out: usize,
}

impl FittedOneHotEncoder {
    fn from_columns(columns: Vec<EncodedColumn>) -> Self {
        let n_features_out = columns.iter().map(|c| c.categories.len()).sum();
        Self {
            columns,
            n_features_out,
        }
    }

    /// Categories of the named column, if it was fitted.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.categories.as_slice())
    }

    /// Output feature names, `column=category`, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.categories.iter().map(move |cat| format!("{}={}", c.name, cat)))
            .collect()
    }
}

impl Transformer for OneHotEncoder {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Table) -> Result<FittedOneHotEncoder> {
        if data.is_empty() {
            return Err(ChurnError::InvalidParameter(
                "cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let cells = data.column(name).ok_or_else(|| {
                ChurnError::schema(name.clone(), "categorical column not found")
            })?;
            let categories: BTreeSet<String> = cells
                .filter_map(|v| v.category().map(|c| c.into_owned()))
                .collect();
            columns.push(EncodedColumn::new(
                name.clone(),
                categories.into_iter().collect(),
            )?);
        }

        Ok(FittedOneHotEncoder::from_columns(columns))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((data.n_rows(), self.n_features_out));

        let mut offset = 0;
        for col in &self.columns {
            // Absent column: every row keeps the all-zero block.
            if let Some(cells) = data.column(&col.name) {
                for (i, cell) in cells.enumerate() {
                    let hit = cell
                        .category()
                        .and_then(|c| col.lookup.get(c.as_ref()).copied());
                    if let Some(idx) = hit {
                        out[[i, offset + idx]] = 1.0;
                    }
                }
            }
            offset += col.categories.len();
        }

        Ok(out)
    }

    fn extract_params(&self) -> OneHotEncoderParams {
        OneHotEncoderParams {
            columns: self
                .columns
                .iter()
                .map(|c| CategoricalColumnParams {
                    name: c.name.clone(),
                    categories: c.categories.clone(),
                })
                .collect(),
        }
    }

    fn from_params(params: OneHotEncoderParams) -> Result<Self> {
        let columns = params
            .columns
            .into_iter()
            .map(|c| EncodedColumn::new(c.name, c.categories))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_columns(columns))
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_csv;

    fn train() -> Table {
        read_csv("Contract,PaymentMethod\nMonthly,Check\nYearly,Card\nMonthly,\n".as_bytes())
            .unwrap()
    }

    fn encoder() -> FittedOneHotEncoder {
        OneHotEncoder::new(vec!["Contract".into(), "PaymentMethod".into()])
            .fit(&train())
            .unwrap()
    }

    #[test]
    fn test_one_hot_categories_sorted() {
        let fitted = encoder();
        assert_eq!(
            fitted.categories("Contract").unwrap(),
            &["Monthly".to_string(), "Yearly".to_string()]
        );
        // Missing cells do not create a category.
        assert_eq!(
            fitted.categories("PaymentMethod").unwrap(),
            &["Card".to_string(), "Check".to_string()]
        );
        assert_eq!(fitted.n_features_out(), 4);
    }

    #[test]
    fn test_one_hot_transform() {
        let out = encoder().transform(&train()).unwrap();
        assert_eq!(out.shape(), &[3, 4]);
        assert_eq!(out.row(0).to_vec(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out.row(1).to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
        // Missing value: all-zero block for that column.
        assert_eq!(out.row(2).to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_unknown_category_is_all_zero() {
        let test = read_csv("Contract,PaymentMethod\nBiennial,Card\n".as_bytes()).unwrap();
        let out = encoder().transform(&test).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_absent_column_is_all_zero() {
        let test = read_csv("PaymentMethod\nCheck\n".as_bytes()).unwrap();
        let out = encoder().transform(&test).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_feature_names() {
        assert_eq!(
            encoder().feature_names(),
            vec![
                "Contract=Monthly",
                "Contract=Yearly",
                "PaymentMethod=Card",
                "PaymentMethod=Check"
            ]
        );
    }

    #[test]
    fn test_one_hot_params_roundtrip() {
        let fitted = encoder();
        let restored = FittedOneHotEncoder::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            restored.transform(&train()).unwrap(),
            fitted.transform(&train()).unwrap()
        );
    }

    #[test]
    fn test_one_hot_from_params_rejects_duplicates() {
        let params = OneHotEncoderParams {
            columns: vec![CategoricalColumnParams {
                name: "Contract".into(),
                categories: vec!["A".into(), "A".into()],
            }],
        };
        assert!(FittedOneHotEncoder::from_params(params).is_err());
    }

    #[test]
    fn test_one_hot_empty_data() {
        let empty = read_csv("Contract\n".as_bytes()).unwrap();
        assert!(OneHotEncoder::new(vec!["Contract".into()]).fit(&empty).is_err());
    }
}
