//! Model artifact: the persisted boundary between training and inference.
//!
//! # Binary layout
//!
//! ```text
//! offset  size  field
//! 0       8     magic  b"CHURNMDL"
//! 8       2     format version, u16 little-endian
//! 10      4     CRC32 of the payload, u32 little-endian
//! 14      ..    bincode-encoded ModelArtifact
//! ```
//!
//! Loading checks every layer (magic, version, checksum, decode) and then
//! the structural consistency of the decoded artifact; any failure is a
//! [`ChurnError::Artifact`].

use crate::error::{ChurnError, Result};
use crate::model::{InferenceModel, LogisticRegressor, SerializableLogisticParams};
use crate::preprocessing::{FittedPreprocessor, FittedTransformer, PreprocessorParams};
use crate::schema::FeatureSchema;
use crate::search::Candidate;
use crate::serialization::SerializableParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAGIC: &[u8; 8] = b"CHURNMDL";
pub const FORMAT_VERSION: u16 = 2;
const HEADER_LEN: usize = 14;

/// Everything inference needs, serialized as one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub preprocessor: PreprocessorParams,
    pub classifier: SerializableLogisticParams,
    /// Hyperparameters chosen by the search.
    pub hyperparameters: Candidate,
    /// Pass-through identifier column configured at training time.
    pub identifier_column: Option<String>,
}

impl ModelArtifact {
    pub fn new(
        schema: FeatureSchema,
        preprocessor: &FittedPreprocessor,
        classifier: &LogisticRegressor,
        hyperparameters: Candidate,
    ) -> Self {
        Self {
            schema,
            preprocessor: preprocessor.extract_params(),
            classifier: classifier.extract_params(),
            hyperparameters,
            identifier_column: None,
        }
    }

    pub fn with_identifier_column(mut self, column: Option<String>) -> Self {
        self.identifier_column = column;
        self
    }

    /// Rebuild the fitted preprocessor and classifier, checking that they
    /// agree with the schema and with each other.
    pub fn restore(&self) -> Result<(FittedPreprocessor, LogisticRegressor)> {
        self.schema
            .validate()
            .map_err(|e| ChurnError::Artifact(e.to_string()))?;

        let numeric = self.preprocessor.numeric.iter().map(|c| &c.name);
        if !numeric.eq(self.schema.numeric().iter()) {
            return Err(ChurnError::Artifact(
                "numeric preprocessor columns do not match the schema".into(),
            ));
        }
        if let Some(id) = &self.identifier_column {
            if self.schema.numeric().contains(id) || self.schema.categorical().contains(id) {
                return Err(ChurnError::Artifact(format!(
                    "identifier column `{}` is also a feature",
                    id
                )));
            }
        }
        let categorical = self.preprocessor.categorical.iter().map(|c| &c.name);
        if !categorical.eq(self.schema.categorical().iter()) {
            return Err(ChurnError::Artifact(
                "categorical preprocessor columns do not match the schema".into(),
            ));
        }

        let preprocessor = FittedPreprocessor::from_params(self.preprocessor.clone())?;
        if self.classifier.weights.len() != preprocessor.n_features_out() {
            return Err(ChurnError::Artifact(format!(
                "classifier has {} weights but the preprocessor yields {} features",
                self.classifier.weights.len(),
                preprocessor.n_features_out()
            )));
        }
        let classifier = LogisticRegressor::from_params(self.classifier.clone())?;

        let c = self.hyperparameters.c;
        if !(c.is_finite() && c > 0.0) {
            return Err(ChurnError::Artifact(format!("invalid regularization strength C={}", c)));
        }
        Ok((preprocessor, classifier))
    }

    /// Structural validation without keeping the rebuilt components.
    pub fn validate(&self) -> Result<()> {
        self.restore().map(|_| ())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = SerializableParams::to_bytes(self)?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode and validate an artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ChurnError::Artifact(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let (header, payload) = bytes.split_at(HEADER_LEN);
        if &header[..8] != MAGIC {
            return Err(ChurnError::Artifact("bad magic; not a churn model".into()));
        }
        let version = u16::from_le_bytes([header[8], header[9]]);
        if version != FORMAT_VERSION {
            return Err(ChurnError::Artifact(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
        let expected = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
        if crc32fast::hash(payload) != expected {
            return Err(ChurnError::Artifact("payload checksum mismatch".into()));
        }

        let artifact: ModelArtifact = SerializableParams::from_bytes(payload)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Pretty JSON rendering for inspection.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ChurnError::Artifact(e.to_string()))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
