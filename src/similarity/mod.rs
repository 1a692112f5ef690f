//! Similarity measures and nearest-neighbour search over embeddings.

mod cosine;

pub use cosine::{l2_norm, l2_normalize_rows, CosineSimilarity};

use ndarray::ArrayView1;
use std::cmp::Ordering;

/// Trait for similarity measures between dense vectors.
pub trait SimilarityMeasure {
    /// Computes the similarity between two vectors.
    fn similarity(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32;

    /// Computes the distance between two vectors.
    ///
    /// Default implementation: 1.0 - similarity.
    fn distance(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
        1.0 - self.similarity(a, b)
    }
}

/// Indices of the `k` highest scores in `scores`, best first.
///
/// `exclude` (usually the query itself) is never returned. NaN scores rank
/// last; equal scores keep index order.
pub fn nearest(scores: ArrayView1<f32>, k: usize, exclude: Option<usize>) -> Vec<usize> {
    if k == 0 {
        return Vec::new();
    }

    let key = |i: usize| {
        let v = scores[i];
        if v.is_nan() {
            f32::NEG_INFINITY
        } else {
            v
        }
    };
    let by_score = |a: &usize, b: &usize| -> Ordering { key(*b).total_cmp(&key(*a)).then(a.cmp(b)) };

    let mut candidates: Vec<usize> = (0..scores.len()).filter(|&i| Some(i) != exclude).collect();
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k, by_score);
        candidates.truncate(k);
    }
    candidates.sort_by(by_score);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_nearest_orders_descending() {
        let scores = arr1(&[0.1, 0.9, 0.5, 0.7]);
        assert_eq!(nearest(scores.view(), 3, None), vec![1, 3, 2]);
    }

    #[test]
    fn test_nearest_excludes_query() {
        let scores = arr1(&[1.0, 0.2, 0.8]);
        assert_eq!(nearest(scores.view(), 2, Some(0)), vec![2, 1]);
    }

    #[test]
    fn test_nearest_k_larger_than_len() {
        let scores = arr1(&[0.3, 0.1]);
        assert_eq!(nearest(scores.view(), 10, None), vec![0, 1]);
        assert!(nearest(scores.view(), 0, None).is_empty());
    }

    #[test]
    fn test_nearest_nan_ranks_last() {
        let scores = arr1(&[f32::NAN, 0.1, 0.2]);
        assert_eq!(nearest(scores.view(), 3, None), vec![2, 1, 0]);
    }

    #[test]
    fn test_nearest_ties_keep_index_order() {
        let scores = arr1(&[0.5, 0.5, 0.5]);
        assert_eq!(nearest(scores.view(), 2, None), vec![0, 1]);
    }
}
