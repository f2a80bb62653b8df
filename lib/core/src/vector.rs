use serde::{Deserialize, Serialize};

/// A dense feature vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// True when every component is zero (a record with nothing to compare)
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    /// Cosine similarity; 0.0 when either side has zero norm or dimensions differ
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let dot_product = crate::ops::dot_product(&self.data, &other.data);
        let norm_a = crate::ops::norm(&self.data);
        let norm_b = crate::ops::norm(&other.data);

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    /// Cosine distance clamped into [0, 1]
    ///
    /// Two zero vectors are identical (0.0). A zero vector against a non-zero
    /// one is maximally dissimilar (1.0). Non-negative feature vectors never
    /// produce a negative cosine, the clamp only guards rounding.
    #[inline]
    pub fn cosine_distance(&self, other: &Vector) -> f32 {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => 0.0,
            (true, false) | (false, true) => 1.0,
            (false, false) => {
                let distance = 1.0 - self.cosine_similarity(other);
                if distance.is_finite() {
                    distance.clamp(0.0, 1.0)
                } else {
                    1.0
                }
            }
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_of_tag_rows() {
        // red+silk vs red+cotton share one of two tags
        let red_silk = Vector::from(vec![1.0, 1.0, 0.0]);
        let red_cotton = Vector::from(vec![1.0, 0.0, 1.0]);
        assert!((red_silk.cosine_similarity(&red_cotton) - 0.5).abs() < 1e-6);

        let mismatched = Vector::zeros(2);
        assert_eq!(red_silk.cosine_similarity(&mismatched), 0.0);
    }

    #[test]
    fn test_cosine_distance_bounds() {
        let a = Vector::new(vec![1.0, 1.0, 0.0]);
        let b = Vector::new(vec![1.0, 1.0, 0.0]);
        let c = Vector::new(vec![0.0, 0.0, 1.0]);

        assert!(a.cosine_distance(&b).abs() < 1e-6);
        assert!((a.cosine_distance(&c) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_zero_vectors() {
        let zero = Vector::zeros(3);
        let other = Vector::new(vec![0.0, 2.0, 0.0]);

        assert_eq!(zero.cosine_distance(&Vector::zeros(3)), 0.0);
        assert_eq!(zero.cosine_distance(&other), 1.0);
        assert_eq!(other.cosine_distance(&zero), 1.0);
    }
}
