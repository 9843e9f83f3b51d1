//! Feature schema derivation and label mapping.
//!
//! The schema decides, once, which columns are numeric and which are
//! categorical. It is then carried as data through fitting, serialization
//! and inference, so no step re-inspects cell types.

use crate::config::SchemaOptions;
use crate::dataset::Table;
use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Numeric and categorical feature columns plus the label column name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
    label: String,
}

impl FeatureSchema {
    /// Build a schema from explicit column lists.
    pub fn new(numeric: Vec<String>, categorical: Vec<String>, label: impl Into<String>) -> Result<Self> {
        let schema = Self {
            numeric,
            categorical,
            label: label.into(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Derive a schema from a labeled training table.
    ///
    /// A column is numeric when every non-missing cell is a number; columns in
    /// `options.coerce_numeric` are numeric regardless. Label, identifier and
    /// dropped columns are excluded.
    ///
    /// # Errors
    /// [`ChurnError::Schema`] when the table is empty, the label column is
    /// absent, a feature column has no usable value, or no features remain.
    pub fn infer(table: &Table, options: &SchemaOptions) -> Result<Self> {
        let label = &options.label_column;
        if !table.has_column(label) {
            return Err(ChurnError::schema(label.clone(), "label column not found"));
        }
        if table.is_empty() {
            return Err(ChurnError::schema(label.clone(), "training table has no rows"));
        }

        let excluded: HashSet<&String> = options.excluded().collect();
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for name in table.columns().iter().filter(|c| !excluded.contains(c)) {
            let Some(cells) = table.column(name) else {
                continue;
            };

            if options.coerce_numeric.contains(name) {
                let mut cells = cells;
                if !cells.any(|v| v.as_number().is_some()) {
                    return Err(ChurnError::schema(
                        name.clone(),
                        "no numeric values; no type can be inferred",
                    ));
                }
                numeric.push(name.clone());
                continue;
            }

            let mut seen_any = false;
            let mut all_numeric = true;
            for cell in cells.filter(|v| !v.is_missing()) {
                seen_any = true;
                if cell.as_number().is_none() {
                    all_numeric = false;
                }
            }
            if !seen_any {
                return Err(ChurnError::schema(
                    name.clone(),
                    "column is entirely missing; no type can be inferred",
                ));
            }
            if all_numeric {
                numeric.push(name.clone());
            } else {
                categorical.push(name.clone());
            }
        }

        let schema = Self::new(numeric, categorical, label.clone())?;
        tracing::debug!(
            numeric = ?schema.numeric,
            categorical = ?schema.categorical,
            label = %schema.label,
            "derived feature schema"
        );
        Ok(schema)
    }

    /// Check the structural invariants: non-empty, disjoint, unique names.
    pub fn validate(&self) -> Result<()> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(ChurnError::schema(self.label.clone(), "no feature columns"));
        }
        let mut seen = HashSet::new();
        for name in self.numeric.iter().chain(&self.categorical) {
            if name == &self.label {
                return Err(ChurnError::schema(name.clone(), "label column used as a feature"));
            }
            if !seen.insert(name) {
                return Err(ChurnError::schema(
                    name.clone(),
                    "column listed more than once in the schema",
                ));
            }
        }
        Ok(())
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Numeric schema columns absent from `table`, in schema order.
    pub fn missing_numeric(&self, table: &Table) -> Vec<String> {
        self.numeric
            .iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect()
    }
}

/// Map the label column to `{0.0, 1.0}`: the positive token is 1, anything
/// else (including missing) is 0.
pub fn encode_labels(table: &Table, options: &SchemaOptions) -> Result<Vec<f64>> {
    let cells = table.column(&options.label_column).ok_or_else(|| {
        ChurnError::schema(options.label_column.clone(), "label column not found")
    })?;
    Ok(cells
        .map(|v| match v.category() {
            Some(c) if c == options.positive_label.as_str() => 1.0,
            _ => 0.0,
        })
        .collect())
}
