//! Hyperparameter search: grid × stratified k-fold, scored by ROC AUC.
//!
//! 1. The grid expands into candidates, C-major with the solver varying
//!    fastest.
//! 2. A preprocessor is fitted on each fold's training rows only. A numeric
//!    column with no value in a fold falls back to its median over all rows.
//! 3. Every (candidate, fold) pair is fitted and scored in parallel.
//! 4. The reduction walks candidates in grid order and keeps the first
//!    strictly greater mean AUC, so ties go to the earlier candidate.

use crate::config::{ChurnConfig, SearchConfig, SolverConfig};
use crate::dataset::{stratified_k_fold, Fold, Table};
use crate::error::{ChurnError, Result};
use crate::metrics::roc_auc;
use crate::model::{InferenceModel, LogisticRegression};
use crate::optimizer::Solver;
use crate::preprocessing::{FittedTransformer, MedianImputer, Preprocessor, Transformer};
use crate::schema::FeatureSchema;
use crate::trainer::Trainer;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the hyperparameter grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Inverse regularization strength.
    pub c: f64,
    pub solver: Solver,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={} solver={}", self.c, self.solver)
    }
}

/// Cartesian product of C values and solvers.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamGrid {
    c_values: Vec<f64>,
    solvers: Vec<Solver>,
}

impl ParamGrid {
    pub fn new(c_values: Vec<f64>, solvers: Vec<Solver>) -> Self {
        Self { c_values, solvers }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.c_values.clone(), config.solvers.clone())
    }

    /// Candidates in grid order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.c_values
            .iter()
            .flat_map(|&c| self.solvers.iter().map(move |&solver| Candidate { c, solver }))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.c_values.len() * self.solvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validation result for one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate: Candidate,
    /// Mean held-out AUC; `None` when any fold failed to converge.
    pub mean_auc: Option<f64>,
    pub fold_aucs: Vec<f64>,
    pub converged: bool,
}

/// Result of a search run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: Candidate,
    pub best_score: Option<f64>,
    /// Per-candidate results in grid order; empty when the search was skipped.
    pub scores: Vec<CandidateScore>,
    /// Folds actually used, after reduction to the minority class size.
    pub n_folds: usize,
    pub skipped: bool,
}

struct FoldData {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_val: Array2<f64>,
    y_val: Vec<f64>,
}

struct PairResult {
    auc: Option<f64>,
    converged: bool,
}

/// Grid search over logistic regression hyperparameters.
#[derive(Clone, Debug)]
pub struct GridSearch {
    grid: ParamGrid,
    n_folds: usize,
    solver: SolverConfig,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, n_folds: usize, solver: SolverConfig) -> Self {
        Self {
            grid,
            n_folds,
            solver,
        }
    }

    pub fn from_config(config: &ChurnConfig) -> Self {
        Self::new(
            ParamGrid::from_config(&config.search),
            config.search.n_folds,
            config.solver.clone(),
        )
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// Run the search over `table` with `{0, 1}` `labels`.
    ///
    /// # Errors
    /// - [`ChurnError::InvalidParameter`] for an empty grid or mismatched
    ///   label count.
    /// - [`ChurnError::Convergence`] when no candidate converges on every
    ///   fold.
    /// - Preprocessing errors from fitting a fold.
    pub fn run(
        &self,
        table: &Table,
        labels: &[f64],
        schema: &FeatureSchema,
    ) -> Result<SearchOutcome> {
        let candidates = self.grid.candidates();
        let Some(&first) = candidates.first() else {
            return Err(ChurnError::InvalidParameter(
                "hyperparameter grid is empty".into(),
            ));
        };
        if labels.len() != table.n_rows() {
            return Err(ChurnError::InvalidParameter(format!(
                "{} labels for {} rows",
                labels.len(),
                table.n_rows()
            )));
        }

        let positives = labels.iter().filter(|&&l| l >= 0.5).count();
        let minority = positives.min(labels.len() - positives);
        let k = self.n_folds.min(minority);
        if k < 2 {
            tracing::info!(
                minority,
                candidate = %first,
                "too few samples per class for cross-validation; using first grid candidate"
            );
            return Ok(SearchOutcome {
                best: first,
                best_score: None,
                scores: Vec::new(),
                n_folds: k,
                skipped: true,
            });
        }
        if k < self.n_folds {
            tracing::info!(requested = self.n_folds, used = k, "reduced fold count to minority class size");
        }

        // Sparse numeric columns may have no value inside a fold.
        let fallback = MedianImputer::new(schema.numeric().to_vec())
            .fit(table)?
            .medians()
            .to_vec();
        let folds = stratified_k_fold(labels, k)?;
        let fold_data = folds
            .par_iter()
            .map(|fold| prepare_fold(table, labels, schema, &fallback, fold))
            .collect::<Result<Vec<_>>>()?;

        let pairs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|ci| (0..k).map(move |fi| (ci, fi)))
            .collect();
        let results = pairs
            .par_iter()
            .map(|&(ci, fi)| self.evaluate(candidates[ci], &fold_data[fi]))
            .collect::<Result<Vec<_>>>()?;

        let scores: Vec<CandidateScore> = candidates
            .iter()
            .zip(results.chunks(k))
            .map(|(&candidate, chunk)| summarize(candidate, chunk))
            .collect();

        let mut best: Option<&CandidateScore> = None;
        for score in &scores {
            let Some(auc) = score.mean_auc else {
                continue;
            };
            if best.and_then(|b| b.mean_auc).map_or(true, |b| auc > b) {
                best = Some(score);
            }
        }

        let Some(best) = best else {
            return Err(ChurnError::Convergence {
                solver: first.solver.to_string(),
                c: first.c,
                iterations: self.solver.max_iter,
            });
        };
        tracing::info!(
            best = %best.candidate,
            mean_auc = best.mean_auc.unwrap_or_default(),
            folds = k,
            "grid search finished"
        );

        Ok(SearchOutcome {
            best: best.candidate,
            best_score: best.mean_auc,
            scores,
            n_folds: k,
            skipped: false,
        })
    }

    fn evaluate(&self, candidate: Candidate, fold: &FoldData) -> Result<PairResult> {
        let trainer = Trainer::builder(candidate.solver, candidate.c)
            .config(&self.solver)
            .build()?;
        let model = LogisticRegression::new(fold.x_train.ncols());
        match trainer.fit(model, &fold.x_train, &fold.y_train) {
            Ok(fitted) => {
                let probs = fitted.predict_batch(&fold.x_val);
                Ok(PairResult {
                    auc: roc_auc(&probs.to_vec(), &fold.y_val),
                    converged: true,
                })
            }
            Err(ChurnError::Convergence { iterations, .. }) => {
                tracing::warn!(candidate = %candidate, iterations, "fold fit did not converge");
                Ok(PairResult {
                    auc: None,
                    converged: false,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn prepare_fold(
    table: &Table,
    labels: &[f64],
    schema: &FeatureSchema,
    fallback: &[f64],
    fold: &Fold,
) -> Result<FoldData> {
    let train = table.select_rows(&fold.train);
    let validation = table.select_rows(&fold.validation);
    let preprocessor = Preprocessor::new(schema.clone())
        .with_fallback_medians(fallback.to_vec())
        .fit(&train)?;
    Ok(FoldData {
        x_train: preprocessor.transform(&train)?,
        y_train: fold.train.iter().map(|&i| labels[i]).collect(),
        x_val: preprocessor.transform(&validation)?,
        y_val: fold.validation.iter().map(|&i| labels[i]).collect(),
    })
}

fn summarize(candidate: Candidate, results: &[PairResult]) -> CandidateScore {
    let converged = results.iter().all(|r| r.converged);
    let fold_aucs: Vec<f64> = results.iter().filter_map(|r| r.auc).collect();
    let mean_auc = if converged && !fold_aucs.is_empty() {
        Some(fold_aucs.iter().sum::<f64>() / fold_aucs.len() as f64)
    } else {
        None
    };
    if !converged {
        tracing::warn!(candidate = %candidate, "excluded from selection: not converged on every fold");
    } else {
        tracing::debug!(candidate = %candidate, mean_auc = mean_auc.unwrap_or_default(), "candidate scored");
    }
    CandidateScore {
        candidate,
        mean_auc,
        fold_aucs,
        converged,
    }
}
