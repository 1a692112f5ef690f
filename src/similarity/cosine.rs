//! Cosine similarity for dense vectors.

use crate::similarity::SimilarityMeasure;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Cosine similarity measure.
///
/// `a·b / (|a| |b|)`, with 0.0 for zero vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl SimilarityMeasure for CosineSimilarity {
    fn similarity(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
        let norm = l2_norm(a) * l2_norm(b);
        if norm > 0.0 {
            a.dot(&b) / norm
        } else {
            0.0
        }
    }
}

/// Euclidean length of a vector.
#[inline]
pub fn l2_norm(v: ArrayView1<f32>) -> f32 {
    v.dot(&v).sqrt()
}

/// Returns a copy of `matrix` with every row scaled to unit length.
///
/// All-zero rows stay zero.
pub fn l2_normalize_rows(matrix: ArrayView2<f32>) -> Array2<f32> {
    let mut normalized = matrix.to_owned();
    normalized
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|x| x / norm);
            }
        });
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_identical() {
        let a = arr1(&[1.0, 2.0, 3.0]);
        let sim = CosineSimilarity.similarity(a.view(), a.view());
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal() {
        let a = arr1(&[1.0, 0.0]);
        let b = arr1(&[0.0, 5.0]);
        assert!(CosineSimilarity.similarity(a.view(), b.view()).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_and_distance() {
        let a = arr1(&[1.0, 1.0]);
        let b = arr1(&[-2.0, -2.0]);
        let sim = CosineSimilarity.similarity(a.view(), b.view());
        let dist = CosineSimilarity.distance(a.view(), b.view());
        assert!((sim + 1.0).abs() < 1e-6);
        assert!((dist - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        let a = arr1(&[0.0, 0.0]);
        let b = arr1(&[1.0, 2.0]);
        assert_eq!(CosineSimilarity.similarity(a.view(), b.view()), 0.0);
    }

    #[test]
    fn test_normalize_rows() {
        let m = arr2(&[[3.0, 4.0], [0.0, 0.0], [0.0, 2.0]]);
        let n = l2_normalize_rows(m.view());
        assert!((n[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((n[[0, 1]] - 0.8).abs() < 1e-6);
        assert_eq!(n.row(1).to_vec(), vec![0.0, 0.0]);
        assert!((l2_norm(n.row(2)) - 1.0).abs() < 1e-6);
    }
}
