//! Distance engine
//!
//! Cross-set and within-set dissimilarity matrices over vectorized records.
//! Every value is in [0.0, 1.0] where 0.0 means identical.

use crate::vectorizer::Vectorized;
use ahash::AHashMap;
use pickwise_core::{Source, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance returned for every candidate when the reference set is empty
pub const NEUTRAL_DISTANCE: f32 = 0.5;

/// Which representation the engine compares. One metric is used for every
/// matrix of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance between term-frequency vectors of the descriptions
    #[default]
    TermFrequency,
    /// Cosine distance between binary multi-label tag rows
    Tags,
}

/// Clamp a raw distance into [0, 1]; non-finite values become neutral
#[inline]
pub fn clamp_distance(distance: f32) -> f32 {
    if distance.is_finite() {
        distance.clamp(0.0, 1.0)
    } else {
        NEUTRAL_DISTANCE
    }
}

/// Row-major distance matrix
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DistanceMatrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mean of each row. A matrix without columns (empty reference set)
    /// yields the neutral distance for every row.
    pub fn row_means(&self) -> Vec<f32> {
        if self.cols == 0 {
            return vec![NEUTRAL_DISTANCE; self.rows];
        }
        (0..self.rows)
            .map(|i| clamp_distance(self.row(i).iter().sum::<f32>() / self.cols as f32))
            .collect()
    }

    /// Mean of each row of a square matrix excluding the diagonal.
    /// A single row has no peers and yields 0.0.
    pub fn off_diagonal_means(&self) -> Vec<f32> {
        debug_assert_eq!(self.rows, self.cols);
        if self.rows <= 1 {
            return vec![0.0; self.rows];
        }
        let peers = (self.cols - 1) as f32;
        (0..self.rows)
            .map(|i| {
                let total: f32 = self
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, d)| *d)
                    .sum();
                clamp_distance(total / peers)
            })
            .collect()
    }
}

/// Computes distance matrices with one fixed metric
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEngine {
    metric: DistanceMetric,
}

impl DistanceEngine {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn pairwise(&self, a: &Vector, b: &Vector) -> f32 {
        clamp_distance(a.cosine_distance(b))
    }

    /// Distance from every left row to every right row.
    /// Rows are independent and computed in parallel.
    pub fn cross_matrix(&self, left: &[Vector], right: &[Vector]) -> DistanceMatrix {
        let rows: Vec<Vec<f32>> = left
            .par_iter()
            .map(|a| right.iter().map(|b| self.pairwise(a, b)).collect())
            .collect();
        DistanceMatrix::new(left.len(), right.len(), rows.concat())
    }

    /// Square matrix of a set against itself with a zero diagonal
    pub fn self_matrix(&self, set: &[Vector]) -> DistanceMatrix {
        let n = set.len();
        let rows: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 0.0 } else { self.pairwise(&set[i], &set[j]) })
                    .collect()
            })
            .collect();
        DistanceMatrix::new(n, n, rows.concat())
    }

    /// Mean distance of each candidate to every reference item.
    /// Empty reference set: [`NEUTRAL_DISTANCE`] for every candidate.
    pub fn mean_cross_distance(&self, candidates: &[Vector], reference: &[Vector]) -> Vec<f32> {
        if reference.is_empty() {
            return vec![NEUTRAL_DISTANCE; candidates.len()];
        }
        self.cross_matrix(candidates, reference).row_means()
    }

    /// Mean distance of each candidate to every other candidate in its batch.
    /// A batch of one yields 0.0.
    pub fn mean_self_distance(&self, candidates: &[Vector]) -> Vec<f32> {
        self.self_matrix(candidates).off_diagonal_means()
    }
}

/// Distance matrices of one scoring run, keyed by (left, right) set.
///
/// Each pair is computed at most once per run. A new run over new inputs
/// starts from an empty cache.
#[derive(Debug, Default)]
pub struct DistanceCache {
    matrices: AHashMap<(Source, Source), DistanceMatrix>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn get(&self, left: Source, right: Source) -> Option<&DistanceMatrix> {
        self.matrices.get(&(left, right))
    }

    /// Matrix between two vectorized sets, computed on first request.
    /// `left == right` produces the self matrix. A set missing from the
    /// vectorization is treated as empty.
    pub fn matrix(
        &mut self,
        engine: &DistanceEngine,
        vectorized: &Vectorized,
        left: Source,
        right: Source,
    ) -> &DistanceMatrix {
        self.matrices.entry((left, right)).or_insert_with(|| {
            let metric = engine.metric();
            let features = |source: Source| {
                vectorized
                    .set(source)
                    .map(|s| s.features(metric))
                    .unwrap_or(&[])
            };
            let matrix = if left == right {
                engine.self_matrix(features(left))
            } else {
                engine.cross_matrix(features(left), features(right))
            };
            debug!(
                %left,
                %right,
                rows = matrix.rows(),
                cols = matrix.cols(),
                "computed distance matrix"
            );
            matrix
        })
    }
}
