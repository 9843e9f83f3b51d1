//! Pipeline configuration.
//!
//! Defaults reproduce the Telco churn setup: label `Churn` with positive token
//! `Yes`, `customerID` dropped, `TotalCharges` coerced to numeric, an 80/20
//! split with seed 42, and a 5-fold search over
//! `C ∈ {0.01, 0.1, 1, 10, 100} × {newton, saga}`.
//!
//! Every section can be overridden from TOML; missing keys keep defaults.
//!
//! ```rust
//! use churnkit::config::ChurnConfig;
//!
//! let cfg = ChurnConfig::from_toml_str(r#"
//! [split]
//! seed = 7
//!
//! [search]
//! c_values = [0.1, 1.0]
//! "#).unwrap();
//! assert_eq!(cfg.split.seed, 7);
//! assert_eq!(cfg.search.c_values, vec![0.1, 1.0]);
//! assert_eq!(cfg.schema.label_column, "Churn");
//! ```

use crate::error::{ChurnError, Result};
use crate::optimizer::Solver;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How raw columns map onto features and labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Column holding the churn outcome.
    pub label_column: String,
    /// Label value mapped to class 1; anything else is class 0.
    pub positive_label: String,
    /// Columns removed before schema inference.
    pub drop_columns: Vec<String>,
    /// Pass-through identifier, never used as a feature.
    pub identifier_column: Option<String>,
    /// Columns forced numeric; non-numeric cells become missing.
    pub coerce_numeric: Vec<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            label_column: "Churn".to_string(),
            positive_label: "Yes".to_string(),
            drop_columns: vec!["customerID".to_string()],
            identifier_column: Some("email".to_string()),
            coerce_numeric: vec!["TotalCharges".to_string()],
        }
    }
}

impl SchemaOptions {
    pub fn with_label(mut self, column: impl Into<String>, positive: impl Into<String>) -> Self {
        self.label_column = column.into();
        self.positive_label = positive.into();
        self
    }

    pub fn with_drop_columns(mut self, columns: Vec<String>) -> Self {
        self.drop_columns = columns;
        self
    }

    pub fn with_identifier(mut self, column: Option<String>) -> Self {
        self.identifier_column = column;
        self
    }

    pub fn with_coerce_numeric(mut self, columns: Vec<String>) -> Self {
        self.coerce_numeric = columns;
        self
    }

    /// Columns that never become features.
    pub(crate) fn excluded(&self) -> impl Iterator<Item = &String> {
        self.drop_columns
            .iter()
            .chain(self.identifier_column.iter())
            .chain(std::iter::once(&self.label_column))
    }
}

/// Train/test split settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

/// Hyperparameter grid and cross-validation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Inverse regularisation strengths, in grid order.
    pub c_values: Vec<f64>,
    /// Solver variants, varying fastest in grid order.
    pub solvers: Vec<Solver>,
    pub n_folds: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c_values: vec![0.01, 0.1, 1.0, 10.0, 100.0],
            solvers: vec![Solver::Newton, Solver::Saga],
            n_folds: 5,
        }
    }
}

/// Iteration budget and tolerance shared by all solvers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iter: usize,
    pub tol: f64,
    /// Seed for the SAGA sample order.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-4,
            seed: 42,
        }
    }
}

/// Full pipeline configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    pub schema: SchemaOptions,
    pub split: SplitConfig,
    pub search: SearchConfig,
    pub solver: SolverConfig,
}

impl ChurnConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ChurnConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_schema(mut self, schema: SchemaOptions) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Reject values no pipeline run could use.
    pub fn validate(&self) -> Result<()> {
        if self.schema.label_column.is_empty() {
            return Err(ChurnError::Config("label_column must not be empty".into()));
        }
        if !(self.split.test_ratio > 0.0 && self.split.test_ratio < 1.0) {
            return Err(ChurnError::Config(format!(
                "split.test_ratio must be in (0, 1), got {}",
                self.split.test_ratio
            )));
        }
        if self.search.c_values.is_empty() || self.search.solvers.is_empty() {
            return Err(ChurnError::Config(
                "search grid needs at least one C value and one solver".into(),
            ));
        }
        if let Some(c) = self
            .search
            .c_values
            .iter()
            .find(|c| !(c.is_finite() && **c > 0.0))
        {
            return Err(ChurnError::Config(format!(
                "C values must be positive and finite, got {}",
                c
            )));
        }
        if self.search.n_folds < 2 {
            return Err(ChurnError::Config(format!(
                "search.n_folds must be at least 2, got {}",
                self.search.n_folds
            )));
        }
        if self.solver.max_iter == 0 || !(self.solver.tol > 0.0) {
            return Err(ChurnError::Config(
                "solver.max_iter and solver.tol must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ChurnConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.search.c_values.len() * cfg.search.solvers.len(), 10);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg = ChurnConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ChurnConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let cfg = ChurnConfig::from_toml_str(
            r#"
            [schema]
            label_column = "Exited"
            positive_label = "1"
            identifier_column = "contact"

            [search]
            solvers = ["saga"]
            n_folds = 3

            [solver]
            max_iter = 200
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schema.label_column, "Exited");
        assert_eq!(cfg.schema.identifier_column.as_deref(), Some("contact"));
        assert_eq!(cfg.schema.drop_columns, vec!["customerID".to_string()]);
        assert_eq!(cfg.search.solvers, vec![Solver::Saga]);
        assert_eq!(cfg.search.n_folds, 3);
        assert_eq!(cfg.solver.max_iter, 200);
        assert_eq!(cfg.solver.tol, 1e-4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = ChurnConfig::from_toml_str("[split]\ntest_ratio = 1.5\n");
        assert!(matches!(bad, Err(ChurnError::Config(_))));

        let bad = ChurnConfig::from_toml_str("[search]\nc_values = [-1.0]\n");
        assert!(matches!(bad, Err(ChurnError::Config(_))));

        let bad = ChurnConfig::from_toml_str("[search]\nn_folds = 1\n");
        assert!(matches!(bad, Err(ChurnError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let bad = ChurnConfig::from_toml_str("[split\nseed = ");
        assert!(matches!(bad, Err(ChurnError::Config(_))));
    }

    #[test]
    fn test_excluded_columns() {
        let opts = SchemaOptions::default();
        let excluded: Vec<&String> = opts.excluded().collect();
        assert_eq!(excluded.len(), 3);
        assert!(excluded.iter().any(|c| c.as_str() == "email"));
        assert!(excluded.iter().any(|c| c.as_str() == "Churn"));
    }
}
