//! Error types for the churn pipeline.
//!
//! Four variants are domain errors and are terminal for the operation that
//! raised them: [`ChurnError::Schema`], [`ChurnError::Convergence`],
//! [`ChurnError::Artifact`] and [`ChurnError::MissingFeature`]. The rest wrap
//! ambient failures (I/O, CSV, configuration).

/// Error type for every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum ChurnError {
    /// Training data is malformed or incompatible with the requested schema.
    #[error("schema error in column `{column}`: {reason}")]
    Schema { column: String, reason: String },

    /// The solver did not reach its tolerance within the iteration budget.
    #[error("{solver} solver did not converge for C={c} after {iterations} iterations")]
    Convergence {
        solver: String,
        c: f64,
        iterations: usize,
    },

    /// A persisted artifact is corrupt or structurally invalid.
    #[error("invalid model artifact: {0}")]
    Artifact(String),

    /// Required numeric columns are absent from an inference table.
    #[error("missing required feature column(s): {}", .columns.join(", "))]
    MissingFeature { columns: Vec<String> },

    /// Invalid hyperparameter or option value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// CSV ingest failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChurnError {
    pub(crate) fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ChurnError::Schema {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for ChurnError {
    fn from(err: bincode::Error) -> Self {
        ChurnError::Artifact(err.to_string())
    }
}

impl From<toml::de::Error> for ChurnError {
    fn from(err: toml::de::Error) -> Self {
        ChurnError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ChurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema() {
        let err = ChurnError::schema("Churn", "label column not found");
        let msg = err.to_string();
        assert!(msg.contains("Churn"));
        assert!(msg.contains("label column not found"));
    }

    #[test]
    fn test_error_display_convergence() {
        let err = ChurnError::Convergence {
            solver: "saga".to_string(),
            c: 100.0,
            iterations: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("saga"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn test_error_display_missing_feature_lists_all_columns() {
        let err = ChurnError::MissingFeature {
            columns: vec!["tenure".to_string(), "MonthlyCharges".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required feature column(s): tenure, MonthlyCharges"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: ChurnError = io_err.into();
        assert!(matches!(err, ChurnError::Io(_)));
    }

    #[test]
    fn test_error_from_bincode_error_is_artifact() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: std::result::Result<String, bincode::Error> =
            bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: ChurnError = e.into();
            assert!(matches!(err, ChurnError::Artifact(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = ChurnError::InvalidParameter("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
