//! # churnkit
//!
//! Customer churn prediction from tabular account data: schema inference,
//! preprocessing, L2-regularized logistic regression selected by stratified
//! cross-validation, and a portable model artifact that carries everything
//! inference needs.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: models and transformers carry their training
//!   state in the type system (`Unfitted` vs `Fitted`); only fitted values
//!   can predict or transform.
//! - **Training/Inference Separation**: the [`ModelArtifact`] is the only
//!   thing that crosses from training to inference. A loaded artifact is
//!   immutable and safe to share across threads.
//! - **Determinism**: the same data, configuration and seeds produce a
//!   byte-identical artifact.
//!
//! ## Quick Start
//!
//! ```no_run
//! use churnkit::{read_csv_path, ChurnConfig, InferencePipeline, TrainingPipeline};
//!
//! # fn main() -> churnkit::Result<()> {
//! let customers = read_csv_path("telco.csv")?;
//! let outcome = TrainingPipeline::new(ChurnConfig::default())?.fit(&customers)?;
//! outcome.artifact.save_to_file("churn.model")?;
//!
//! let pipeline = InferencePipeline::load("churn.model")?;
//! for result in pipeline.predict(&read_csv_path("new_customers.csv")?)? {
//!     println!("{} {}", result.label_text(), result.probability_percent());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: tables of named mixed-type columns, CSV ingest, stratified splits
//! - `schema`: numeric/categorical feature schema and label encoding
//! - `preprocessing`: median imputation, standardization, one-hot encoding
//! - `model`: logistic regression with stateful type parameters
//! - `loss`, `regularizers`, `optimizer`: objective pieces and solvers
//! - `trainer`: fits a model to a fixed hyperparameter candidate
//! - `search`: cross-validated grid search over C and solver
//! - `artifact`: versioned, checksummed model persistence
//! - `pipeline`: end-to-end training and inference
//! - `notify`: hand-off of high-risk customers to a retention workflow

/// Versioned model artifact persistence.
pub mod artifact;

/// Pipeline configuration loadable from TOML.
pub mod config;

/// Tabular data, CSV ingest and stratified splitting.
pub mod dataset;

pub mod error;

/// Differentiable loss functions for model training.
pub mod loss;

/// Classification metrics.
pub mod metrics;

/// Machine learning models with compile-time state safety.
pub mod model;

pub mod notify;

/// Solvers for the regularized logistic objective.
pub mod optimizer;

pub mod pipeline;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Weight regularization strategies.
pub mod regularizers;

/// Feature schema derivation and label encoding.
pub mod schema;

/// Hyperparameter search.
pub mod search;

/// Binary parameter serialization.
pub mod serialization;

/// Model fitting orchestration.
pub mod trainer;

pub use artifact::ModelArtifact;
pub use config::{ChurnConfig, SchemaOptions, SearchConfig, SolverConfig, SplitConfig};
pub use dataset::{read_csv, read_csv_path, write_csv, Table, Value};
pub use error::{ChurnError, Result};
pub use metrics::EvaluationMetrics;
pub use notify::{notify_high_risk, LogNotifier, NotificationSummary, RetentionNotifier};
pub use optimizer::Solver;
pub use pipeline::{
    annotate, high_risk, InferencePipeline, PredictionResult, TrainingOutcome, TrainingPipeline,
    TrainingReport,
};
pub use schema::FeatureSchema;
pub use search::Candidate;
