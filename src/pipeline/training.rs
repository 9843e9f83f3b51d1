use crate::artifact::ModelArtifact;
use crate::config::ChurnConfig;
use crate::dataset::{stratified_split, Table};
use crate::error::{ChurnError, Result};
use crate::metrics::EvaluationMetrics;
use crate::model::{InferenceModel, LogisticRegression};
use crate::preprocessing::{FittedTransformer, Preprocessor, Transformer};
use crate::schema::{encode_labels, FeatureSchema};
use crate::search::{GridSearch, SearchOutcome};
use crate::trainer::Trainer;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// What a training run reports besides the artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    /// Transformed feature names, in weight order.
    pub feature_names: Vec<String>,
    pub search: SearchOutcome,
    /// Held-out metrics; `None` when the test split is empty.
    pub test_metrics: Option<EvaluationMetrics>,
}

/// Result of [`TrainingPipeline::fit`].
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: TrainingReport,
}

/// Stratified split, schema derivation, grid search, final fit and
/// held-out evaluation.
#[derive(Clone, Debug)]
pub struct TrainingPipeline {
    config: ChurnConfig,
}

impl TrainingPipeline {
    pub fn new(config: ChurnConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChurnConfig {
        &self.config
    }

    /// Train on a labeled table. The caller's table is not modified.
    ///
    /// # Errors
    /// - [`ChurnError::Schema`] when the label column is missing, a class is
    ///   absent from the training split, or no schema can be derived.
    /// - [`ChurnError::Convergence`] when no grid candidate converges or the
    ///   final fit does not converge.
    pub fn fit(&self, table: &Table) -> Result<TrainingOutcome> {
        let options = &self.config.schema;
        let table = table.without_columns(&options.drop_columns);
        let labels = encode_labels(&table, options)?;

        let split = stratified_split(&labels, self.config.split.test_ratio, self.config.split.seed)?;
        let train = table.select_rows(&split.train);
        let test = table.select_rows(&split.test);
        let y_train: Vec<f64> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();

        let positives = y_train.iter().filter(|&&l| l >= 0.5).count();
        if positives == 0 || positives == y_train.len() {
            return Err(ChurnError::schema(
                options.label_column.clone(),
                "training data must contain both label classes",
            ));
        }

        let schema = FeatureSchema::infer(&train, options)?;
        let search = GridSearch::from_config(&self.config).run(&train, &y_train, &schema)?;
        let best = search.best;

        let preprocessor = Preprocessor::new(schema.clone()).fit(&train)?;
        let x_train = preprocessor.transform(&train)?;
        let model = Trainer::builder(best.solver, best.c)
            .config(&self.config.solver)
            .build()?
            .fit(
                LogisticRegression::new(x_train.ncols()),
                &x_train,
                &Array1::from(y_train),
            )?;

        let test_metrics = if test.is_empty() {
            None
        } else {
            let x_test = preprocessor.transform(&test)?;
            let probabilities = model.predict_batch(&x_test).to_vec();
            let predictions = model.predict_labels(&x_test);
            Some(EvaluationMetrics::compute(&predictions, &probabilities, &y_test)?)
        };

        match &test_metrics {
            Some(m) => tracing::info!(
                candidate = %best,
                n_train = split.train.len(),
                n_test = split.test.len(),
                metrics = %m,
                "training finished"
            ),
            None => tracing::info!(
                candidate = %best,
                n_train = split.train.len(),
                "training finished; test split is empty"
            ),
        }

        let report = TrainingReport {
            n_train: split.train.len(),
            n_test: split.test.len(),
            feature_names: preprocessor.feature_names(),
            search,
            test_metrics,
        };
        Ok(TrainingOutcome {
            artifact: ModelArtifact::new(schema, &preprocessor, &model, best)
                .with_identifier_column(options.identifier_column.clone()),
            report,
        })
    }
}
