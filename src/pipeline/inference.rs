use crate::artifact::ModelArtifact;
use crate::dataset::{Table, Value};
use crate::error::Result;
use crate::model::{InferenceModel, LogisticRegressor};
use crate::preprocessing::{FittedPreprocessor, FittedTransformer};
use crate::schema::FeatureSchema;
use crate::search::Candidate;
use serde::Serialize;
use std::path::Path;

/// Prediction for one input record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Position of the record in the input table.
    pub row: usize,
    /// 1 when `probability >= 0.5`.
    pub label: u8,
    pub probability: f64,
    /// Pass-through identifier, when the column is present and non-empty.
    pub identifier: Option<String>,
}

impl PredictionResult {
    pub fn is_high_risk(&self) -> bool {
        self.label == 1
    }

    /// `"Yes"` for churn, `"No"` otherwise.
    pub fn label_text(&self) -> &'static str {
        if self.is_high_risk() {
            "Yes"
        } else {
            "No"
        }
    }

    /// Probability as a percentage with two decimals, e.g. `"73.10%"`.
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Records predicted to churn, in input order.
pub fn high_risk(results: &[PredictionResult]) -> impl Iterator<Item = &PredictionResult> {
    results.iter().filter(|r| r.is_high_risk())
}

/// The input table with `churn_prediction` (`Yes`/`No`) and
/// `churn_probability` (percent) columns. Input columns of the same name are
/// overwritten in place.
pub fn annotate(table: &Table, results: &[PredictionResult]) -> Result<Table> {
    let labels = results.iter().map(|r| Value::from(r.label_text())).collect();
    let probabilities = results
        .iter()
        .map(|r| Value::from(r.probability_percent()))
        .collect();
    table
        .set_column("churn_prediction", labels)?
        .set_column("churn_probability", probabilities)
}

/// Applies a loaded artifact to new records.
///
/// Immutable after construction and `Send + Sync`; wrap in an `Arc` to
/// serve concurrent callers.
#[derive(Clone, Debug)]
pub struct InferencePipeline {
    schema: FeatureSchema,
    preprocessor: FittedPreprocessor,
    model: LogisticRegressor,
    hyperparameters: Candidate,
    identifier_column: Option<String>,
}

impl InferencePipeline {
    /// Build from an artifact, validating it.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        let (preprocessor, model) = artifact.restore()?;
        Ok(Self {
            schema: artifact.schema.clone(),
            preprocessor,
            model,
            hyperparameters: artifact.hyperparameters,
            identifier_column: artifact.identifier_column.clone(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_artifact(&ModelArtifact::from_bytes(bytes)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_artifact(&ModelArtifact::load_from_file(path)?)
    }

    /// Column carried through to [`PredictionResult::identifier`],
    /// overriding the one recorded in the artifact.
    pub fn with_identifier(mut self, column: Option<String>) -> Self {
        self.identifier_column = column;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn hyperparameters(&self) -> Candidate {
        self.hyperparameters
    }

    pub fn identifier_column(&self) -> Option<&str> {
        self.identifier_column.as_deref()
    }

    /// Score every record, preserving input order.
    ///
    /// # Errors
    /// [`ChurnError::MissingFeature`](crate::error::ChurnError::MissingFeature)
    /// naming every numeric schema column absent from `table`.
    pub fn predict(&self, table: &Table) -> Result<Vec<PredictionResult>> {
        let features = self.preprocessor.transform(table)?;
        let probabilities = self.model.predict_batch(&features);

        let id_column = self
            .identifier_column
            .as_deref()
            .filter(|c| table.has_column(c));
        if let (Some(wanted), None) = (self.identifier_column.as_deref(), id_column) {
            tracing::warn!(column = wanted, "identifier column not found; results carry no identifiers");
        }

        Ok(probabilities
            .iter()
            .enumerate()
            .map(|(row, &probability)| PredictionResult {
                row,
                label: u8::from(probability >= 0.5),
                probability,
                identifier: id_column
                    .and_then(|c| table.get(row, c))
                    .and_then(Value::category)
                    .map(|c| c.into_owned()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_csv;
    use crate::error::ChurnError;
    use crate::model::SerializableLogisticParams;
    use crate::optimizer::Solver;
    use crate::preprocessing::{CategoricalColumnParams, NumericColumnParams, PreprocessorParams};

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            schema: FeatureSchema::new(vec!["tenure".into()], vec!["Contract".into()], "Churn")
                .unwrap(),
            preprocessor: PreprocessorParams {
                numeric: vec![NumericColumnParams {
                    name: "tenure".into(),
                    median: 10.0,
                    mean: 10.0,
                    std: 5.0,
                }],
                categorical: vec![CategoricalColumnParams {
                    name: "Contract".into(),
                    categories: vec!["Monthly".into(), "Yearly".into()],
                }],
            },
            classifier: SerializableLogisticParams {
                weights: vec![-2.0, 1.0, -1.0],
                bias: 0.0,
            },
            hyperparameters: Candidate {
                c: 1.0,
                solver: Solver::Newton,
            },
            identifier_column: Some("email".into()),
        }
    }

    fn pipeline() -> InferencePipeline {
        InferencePipeline::from_artifact(&artifact()).unwrap()
    }

    #[test]
    fn test_predict_order_and_identifiers() {
        let table = read_csv(
            "tenure,Contract,email\n0,Monthly,a@x.io\n20,Yearly,\n10,Other,c@x.io\n".as_bytes(),
        )
        .unwrap();
        let results = pipeline().predict(&table).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().map(|r| r.row).collect::<Vec<_>>(), vec![0, 1, 2]);

        // z = -2 * (0 - 10) / 5 + 1 = 5
        assert_eq!(results[0].label, 1);
        assert_eq!(results[0].identifier.as_deref(), Some("a@x.io"));
        assert_eq!(results[1].label, 0);
        assert_eq!(results[1].identifier, None);
        // Unknown category and mean tenure: z = 0, p = 0.5.
        assert_eq!(results[2].probability, 0.5);
        assert_eq!(results[2].label, 1);

        let flagged: Vec<usize> = high_risk(&results).map(|r| r.row).collect();
        assert_eq!(flagged, vec![0, 2]);
    }

    #[test]
    fn test_predict_missing_numeric_column() {
        let table = read_csv("Contract,email\nMonthly,a@x.io\n".as_bytes()).unwrap();
        assert!(matches!(
            pipeline().predict(&table),
            Err(ChurnError::MissingFeature { columns }) if columns == vec!["tenure".to_string()]
        ));
    }

    #[test]
    fn test_predict_absent_categorical_column() {
        let table = read_csv("tenure\n10\n".as_bytes()).unwrap();
        let results = pipeline().predict(&table).unwrap();
        assert_eq!(results[0].probability, 0.5);
        assert_eq!(results[0].identifier, None);
    }

    #[test]
    fn test_predict_is_pure() {
        let table = read_csv("tenure,Contract\n3,Monthly\n17,Yearly\n".as_bytes()).unwrap();
        let p = pipeline();
        assert_eq!(p.predict(&table).unwrap(), p.predict(&table).unwrap());
    }

    #[test]
    fn test_display_formatting() {
        let r = PredictionResult {
            row: 0,
            label: 1,
            probability: 0.731,
            identifier: None,
        };
        assert_eq!(r.label_text(), "Yes");
        assert_eq!(r.probability_percent(), "73.10%");
        let r = PredictionResult {
            label: 0,
            probability: 0.0,
            ..r
        };
        assert_eq!(r.label_text(), "No");
        assert_eq!(r.probability_percent(), "0.00%");
    }

    #[test]
    fn test_custom_identifier_column() {
        let table = read_csv("tenure,Contract,customerID\n0,Monthly,7590-VHVEG\n".as_bytes()).unwrap();
        let results = pipeline()
            .with_identifier(Some("customerID".into()))
            .predict(&table)
            .unwrap();
        assert_eq!(results[0].identifier.as_deref(), Some("7590-VHVEG"));
    }

    #[test]
    fn test_identifier_keeps_leading_zeros() {
        let table = read_csv("tenure,Contract,email\n0,Monthly,0042\n20,Yearly,1e3\n".as_bytes()).unwrap();
        let results = pipeline().predict(&table).unwrap();
        assert_eq!(results[0].identifier.as_deref(), Some("0042"));
        assert_eq!(results[1].identifier.as_deref(), Some("1e3"));
    }

    #[test]
    fn test_identifier_column_comes_from_artifact() {
        let mut a = artifact();
        a.identifier_column = Some("customerID".into());
        let p = InferencePipeline::from_artifact(&a).unwrap();
        assert_eq!(p.identifier_column(), Some("customerID"));

        let table = read_csv("tenure,Contract,customerID\n0,Monthly,7590-VHVEG\n".as_bytes()).unwrap();
        let results = p.predict(&table).unwrap();
        assert_eq!(results[0].identifier.as_deref(), Some("7590-VHVEG"));
        assert_eq!(p.with_identifier(None).identifier_column(), None);
    }

    #[test]
    fn test_annotate_overwrites_existing_prediction_columns() {
        let table = read_csv(
            "tenure,churn_prediction,Contract,churn_probability\n0,old,Monthly,1%\n20,old,Yearly,2%\n"
                .as_bytes(),
        )
        .unwrap();
        let results = pipeline().predict(&table).unwrap();
        let out = annotate(&table, &results).unwrap();
        assert_eq!(out.columns(), table.columns());
        assert_eq!(out.get(0, "churn_prediction"), Some(&Value::from("Yes")));
        assert_eq!(out.get(1, "churn_prediction"), Some(&Value::from("No")));
        assert_eq!(
            out.get(0, "churn_probability"),
            Some(&Value::from(results[0].probability_percent()))
        );

        let fresh = read_csv("tenure,Contract\n0,Monthly\n".as_bytes()).unwrap();
        let out = annotate(&fresh, &pipeline().predict(&fresh).unwrap()).unwrap();
        assert_eq!(out.columns()[2..], ["churn_prediction", "churn_probability"]);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            InferencePipeline::from_bytes(&[0u8; 32]),
            Err(ChurnError::Artifact(_))
        ));
    }
}
