//! Stratified train/test splitting and k-fold partitioning.
//!
//! Both operate on binary labels (`0.0` / `1.0`) and return row indices, so
//! callers can slice tables and label vectors consistently.

use crate::error::{ChurnError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test split, each sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// One cross-validation fold: rows to fit on and rows to score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

fn class_indices(labels: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut negatives = Vec::new();
    let mut positives = Vec::new();
    for (i, &l) in labels.iter().enumerate() {
        if l >= 0.5 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    (negatives, positives)
}

/// Split rows so that both parts preserve the class proportions.
///
/// Each class is shuffled with a ChaCha8 RNG seeded from `seed`, and
/// `round(class_size * test_ratio)` of its rows go to the test part.
pub fn stratified_split(labels: &[f64], test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ChurnError::InvalidParameter(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }

    let (mut negatives, mut positives) = class_indices(labels);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    negatives.shuffle(&mut rng);
    positives.shuffle(&mut rng);

    let n_test_neg = (negatives.len() as f64 * test_ratio).round() as usize;
    let n_test_pos = (positives.len() as f64 * test_ratio).round() as usize;

    let mut test: Vec<usize> = negatives[..n_test_neg]
        .iter()
        .chain(positives[..n_test_pos].iter())
        .copied()
        .collect();
    let mut train: Vec<usize> = negatives[n_test_neg..]
        .iter()
        .chain(positives[n_test_pos..].iter())
        .copied()
        .collect();
    test.sort_unstable();
    train.sort_unstable();

    tracing::debug!(
        train = train.len(),
        test = test.len(),
        test_negatives = n_test_neg,
        test_positives = n_test_pos,
        "stratified split"
    );

    Ok(TrainTestSplit { train, test })
}

/// Partition rows into `k` stratified folds without shuffling.
///
/// Within each class, the i-th row (in table order) lands in fold `i % k`,
/// so every fold receives at least one row of each class as long as
/// `k <= min(class sizes)`.
pub fn stratified_k_fold(labels: &[f64], k: usize) -> Result<Vec<Fold>> {
    if k < 2 {
        return Err(ChurnError::InvalidParameter(format!(
            "k-fold requires at least 2 folds, got {}",
            k
        )));
    }
    let (negatives, positives) = class_indices(labels);
    let smallest = negatives.len().min(positives.len());
    if k > smallest {
        return Err(ChurnError::InvalidParameter(format!(
            "cannot make {} stratified folds when the smallest class has {} rows",
            k, smallest
        )));
    }

    let mut fold_of = vec![0usize; labels.len()];
    for class in [&negatives, &positives] {
        for (pos, &row) in class.iter().enumerate() {
            fold_of[row] = pos % k;
        }
    }

    Ok((0..k)
        .map(|f| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| fold_of[row] == f);
            Fold { train, validation }
        })
        .collect())
}
