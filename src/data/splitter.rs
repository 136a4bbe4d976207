// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Two independent ways to partition the sample index range
// [0, n_sample) into training and test sets:
//
//   Evaluation split - shuffled train/test split, then shuffled
//                      k-fold cross-validation inside train.
//                      Used for model selection.
//
//   Streaming split  - order-preserving prefix/suffix split.
//                      Rows are in source order (roughly
//                      chronological), so the test set models
//                      deployment on future teams.
//
// The split sizes follow floor(n * train_ratio) for train.
// Shuffling uses Fisher-Yates via rand::seq::SliceRandom on a
// caller-supplied seeded RNG, so identical seeds give identical
// splits.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default share of samples that go to training.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.85;

/// Invalid arguments to a split generator.
#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("n_sample must be positive")]
    NoSamples,

    #[error("train_ratio must lie strictly between 0 and 1, got {0}")]
    RatioOutOfRange(f64),

    #[error("train_ratio {ratio} leaves an empty partition for {n_sample} samples")]
    EmptyPartition { n_sample: usize, ratio: f64 },

    #[error("n_folds must be at least 2, got {0}")]
    TooFewFolds(usize),

    #[error("cannot make {n_folds} folds from {n_train} training samples")]
    TooManyFolds { n_folds: usize, n_train: usize },
}

/// One cross-validation fold over the training indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

/// Shuffled test set plus k-fold folds over the remaining indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSplits {
    pub test:  Vec<usize>,
    pub folds: BTreeMap<usize, Fold>,
}

impl EvaluationSplits {
    /// All training indices (union of any fold's train and valid).
    pub fn train(&self) -> Vec<usize> {
        let mut train: Vec<usize> = self
            .folds
            .get(&0)
            .map(|f| f.train.iter().chain(&f.valid).copied().collect())
            .unwrap_or_default();
        train.sort_unstable();
        train
    }
}

/// Order-preserving train prefix and test suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingSplits {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Either kind of split, as handed to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splits {
    Evaluation(EvaluationSplits),
    Streaming(StreamingSplits),
}

impl Splits {
    /// File name the split is persisted under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Splits::Evaluation(_) => "splits.json",
            Splits::Streaming(_)  => "temporal_splits.json",
        }
    }

    /// Number of samples on the training side.
    pub fn n_train(&self) -> usize {
        match self {
            Splits::Evaluation(s) => s.train().len(),
            Splits::Streaming(s)  => s.train.len(),
        }
    }

    pub fn test(&self) -> &[usize] {
        match self {
            Splits::Evaluation(s) => &s.test,
            Splits::Streaming(s)  => &s.test,
        }
    }
}

/// Number of training samples for `n_sample` at `train_ratio`.
fn train_size(n_sample: usize, train_ratio: f64) -> Result<usize, SplitError> {
    if n_sample == 0 {
        return Err(SplitError::NoSamples);
    }
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(SplitError::RatioOutOfRange(train_ratio));
    }

    let n_train = ((n_sample as f64) * train_ratio).floor() as usize;
    if n_train == 0 || n_train >= n_sample {
        return Err(SplitError::EmptyPartition { n_sample, ratio: train_ratio });
    }
    Ok(n_train)
}

/// Shuffle-split [0, n_sample) into test and train, then cut train
/// into `n_folds` shuffled cross-validation folds.
///
/// The RNG is consumed in a fixed order (one permutation for the
/// test split, one for the folds), so a given seed always yields
/// the same splits.
pub fn create_evaluation_splits<R: Rng + ?Sized>(
    n_sample:    usize,
    n_folds:     usize,
    train_ratio: f64,
    rng:         &mut R,
) -> Result<EvaluationSplits, SplitError> {
    let n_train = train_size(n_sample, train_ratio)?;
    let n_test  = n_sample - n_train;

    if n_folds < 2 {
        return Err(SplitError::TooFewFolds(n_folds));
    }
    if n_folds > n_train {
        return Err(SplitError::TooManyFolds { n_folds, n_train });
    }

    let mut perm: Vec<usize> = (0..n_sample).collect();
    perm.shuffle(rng);
    let train = perm.split_off(n_test);
    let test  = perm;

    // Positions into `train`, shuffled, then cut into contiguous
    // chunks; the first (len % k) chunks take one extra element.
    let mut positions: Vec<usize> = (0..n_train).collect();
    positions.shuffle(rng);

    let base  = n_train / n_folds;
    let extra = n_train % n_folds;

    let mut folds = BTreeMap::new();
    let mut start = 0;
    for k in 0..n_folds {
        let size = base + usize::from(k < extra);
        let chunk = &positions[start..start + size];

        let mut in_valid = vec![false; n_train];
        for &p in chunk {
            in_valid[p] = true;
        }

        let valid: Vec<usize> = chunk.iter().map(|&p| train[p]).collect();
        let fold_train: Vec<usize> = (0..n_train)
            .filter(|&p| !in_valid[p])
            .map(|p| train[p])
            .collect();

        folds.insert(k, Fold { train: fold_train, valid });
        start += size;
    }

    tracing::debug!(
        "Evaluation split: {} train, {} test, {} folds",
        n_train,
        n_test,
        n_folds
    );

    Ok(EvaluationSplits { test, folds })
}

/// Split [0, n_sample) into a train prefix and test suffix without
/// shuffling.
pub fn create_streaming_splits(
    n_sample:    usize,
    train_ratio: f64,
) -> Result<StreamingSplits, SplitError> {
    let n_train = train_size(n_sample, train_ratio)?;

    let train: Vec<usize> = (0..n_train).collect();
    let test:  Vec<usize> = (n_train..n_sample).collect();

    tracing::debug!("Streaming split: {} train, {} test", train.len(), test.len());

    Ok(StreamingSplits { train, test })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_streaming_preserves_order() {
        let s = create_streaming_splits(10, 0.8).unwrap();
        assert_eq!(s.train, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(s.test, vec![8, 9]);
    }

    #[test]
    fn test_streaming_floors_train_size() {
        // 7 * 0.85 = 5.95 → 5 train samples
        let s = create_streaming_splits(7, 0.85).unwrap();
        assert_eq!(s.train.len(), 5);
        assert_eq!(s.test, vec![5, 6]);
    }

    #[test]
    fn test_evaluation_covers_every_index_once() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = create_evaluation_splits(100, 5, 0.85, &mut rng).unwrap();

        let train = s.train();
        assert_eq!(train.len(), 85);
        assert_eq!(s.test.len(), 15);

        let all = sorted(train.iter().chain(&s.test).copied().collect());
        assert_eq!(all, (0..100).collect::<Vec<_>>());

        let test: HashSet<usize> = s.test.iter().copied().collect();
        assert!(train.iter().all(|i| !test.contains(i)));
    }

    #[test]
    fn test_folds_partition_train() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = create_evaluation_splits(53, 4, 0.85, &mut rng).unwrap();
        let train = s.train();

        assert_eq!(s.folds.len(), 4);
        let mut all_valid = Vec::new();
        for fold in s.folds.values() {
            let valid: HashSet<usize> = fold.valid.iter().copied().collect();
            assert!(fold.train.iter().all(|i| !valid.contains(i)));

            let union = sorted(fold.train.iter().chain(&fold.valid).copied().collect());
            assert_eq!(union, train);
            all_valid.extend(fold.valid.iter().copied());
        }

        // every training index is validated in exactly one fold
        assert_eq!(sorted(all_valid), train);
    }

    #[test]
    fn test_fold_sizes_differ_by_at_most_one() {
        let mut rng = StdRng::seed_from_u64(1);
        // 45 * 0.85 = 38.25 → 38 train, 4 folds → 10, 10, 9, 9
        let s = create_evaluation_splits(45, 4, 0.85, &mut rng).unwrap();
        let sizes: Vec<usize> = s.folds.values().map(|f| f.valid.len()).collect();
        assert_eq!(sizes, vec![10, 10, 9, 9]);
    }

    #[test]
    fn test_same_seed_same_splits() {
        let a = create_evaluation_splits(200, 3, 0.85, &mut StdRng::seed_from_u64(0)).unwrap();
        let b = create_evaluation_splits(200, 3, 0.85, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(a, b);

        let c = create_streaming_splits(200, 0.85).unwrap();
        let d = create_streaming_splits(200, 0.85).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(create_streaming_splits(0, 0.8), Err(SplitError::NoSamples));
        assert_eq!(create_streaming_splits(10, 1.0), Err(SplitError::RatioOutOfRange(1.0)));
        assert_eq!(create_streaming_splits(10, 0.0), Err(SplitError::RatioOutOfRange(0.0)));
        assert!(matches!(
            create_streaming_splits(10, f64::NAN),
            Err(SplitError::RatioOutOfRange(_))
        ));
        assert_eq!(
            create_streaming_splits(1, 0.5),
            Err(SplitError::EmptyPartition { n_sample: 1, ratio: 0.5 })
        );

        assert_eq!(
            create_evaluation_splits(0, 3, 0.85, &mut rng),
            Err(SplitError::NoSamples)
        );
        assert_eq!(
            create_evaluation_splits(10, 1, 0.8, &mut rng),
            Err(SplitError::TooFewFolds(1))
        );
        assert_eq!(
            create_evaluation_splits(10, 9, 0.8, &mut rng),
            Err(SplitError::TooManyFolds { n_folds: 9, n_train: 8 })
        );
    }
}
