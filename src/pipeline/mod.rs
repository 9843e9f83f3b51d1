//! End-to-end training and inference.
//!
//! [`TrainingPipeline`] turns a labeled table into a [`ModelArtifact`];
//! [`InferencePipeline`] loads one and scores new records.
//!
//! [`ModelArtifact`]: crate::artifact::ModelArtifact

pub mod inference;
pub mod training;

pub use inference::{annotate, high_risk, InferencePipeline, PredictionResult};
pub use training::{TrainingOutcome, TrainingPipeline, TrainingReport};
