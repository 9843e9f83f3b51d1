//! Classification metrics for model selection and held-out evaluation.

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Area under the ROC curve, from positive-class scores and `{0, 1}` labels.
///
/// Computed as the normalized Mann-Whitney U statistic with tied scores
/// given their average rank. `None` when either class is absent.
pub fn roc_auc(scores: &[f64], labels: &[f64]) -> Option<f64> {
    if scores.len() != labels.len() {
        return None;
    }
    let n_pos = labels.iter().filter(|&&l| l >= 0.5).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end share their mean.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end]
            .iter()
            .filter(|&&i| labels[i] >= 0.5)
            .count();
        pos_rank_sum += avg_rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}

/// Held-out evaluation of a fitted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the evaluation set holds a single class.
    pub roc_auc: Option<f64>,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_count: usize,
}

impl EvaluationMetrics {
    /// Compute metrics from predicted labels, positive-class probabilities
    /// and ground truth.
    pub fn compute(predictions: &[u8], probabilities: &[f64], labels: &[f64]) -> Result<Self> {
        if predictions.len() != labels.len() || probabilities.len() != labels.len() {
            return Err(ChurnError::InvalidParameter(format!(
                "metric inputs differ in length: {} predictions, {} probabilities, {} labels",
                predictions.len(),
                probabilities.len(),
                labels.len()
            )));
        }

        let (mut tp, mut fp, mut tn, mut fn_count) = (0usize, 0usize, 0usize, 0usize);
        for (&pred, &label) in predictions.iter().zip(labels) {
            match (pred == 1, label >= 0.5) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_count += 1,
            }
        }

        let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
        let accuracy = ratio(tp + tn, tp + fp + tn + fn_count);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_count);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(Self {
            accuracy,
            precision,
            recall,
            f1,
            roc_auc: roc_auc(probabilities, labels),
            tp,
            fp,
            tn,
            fn_count,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_count
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "acc={:.4} prec={:.4} rec={:.4} f1={:.4} auc=",
            self.accuracy, self.precision, self.recall, self.f1,
        )?;
        match self.roc_auc {
            Some(auc) => write!(f, "{:.4}", auc)?,
            None => f.write_str("n/a")?,
        }
        write!(
            f,
            " (tp={} fp={} tn={} fn={})",
            self.tp, self.fp, self.tn, self.fn_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &labels), Some(1.0));
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &labels), Some(0.0));
    }

    #[test]
    fn test_auc_ties_count_half() {
        let labels = [0.0, 1.0];
        assert_eq!(roc_auc(&[0.5, 0.5], &labels), Some(0.5));

        // pos {0.4, 0.8}, neg {0.4, 0.1}: pairs won 1 + 0.5 + 1 + 1 of 4
        let auc = roc_auc(&[0.4, 0.8, 0.4, 0.1], &[1.0, 1.0, 0.0, 0.0]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class() {
        assert_eq!(roc_auc(&[0.1, 0.2], &[1.0, 1.0]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn test_mixed() {
        // 3 TP, 1 FP, 2 TN, 1 FN
        let preds = [1, 1, 1, 1, 0, 0, 0];
        let labels = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let probs = [0.9, 0.8, 0.7, 0.6, 0.3, 0.2, 0.1];
        let m = EvaluationMetrics::compute(&preds, &probs, &labels).unwrap();
        assert_eq!((m.tp, m.fp, m.tn, m.fn_count), (3, 1, 2, 1));
        assert!((m.accuracy - 5.0 / 7.0).abs() < 1e-9);
        assert!((m.precision - 0.75).abs() < 1e-9);
        assert!((m.recall - 0.75).abs() < 1e-9);
        assert!((m.f1 - 0.75).abs() < 1e-9);
        assert_eq!(m.n_samples(), 7);
        assert!(m.to_string().contains("tp=3"));
    }

    #[test]
    fn test_empty() {
        let m = EvaluationMetrics::compute(&[], &[], &[]).unwrap();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.roc_auc, None);
        assert!(m.to_string().contains("auc=n/a"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(EvaluationMetrics::compute(&[1], &[0.5, 0.2], &[1.0]).is_err());
    }
}
