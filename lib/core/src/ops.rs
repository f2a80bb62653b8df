// Scalar kernels behind cosine distance between feature rows

/// Dot product of two equal-length slices; 0.0 on length mismatch
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;

    // Two accumulators over chunks of 8
    let chunks = a.chunks_exact(8);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(8);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        dot0 += a_chunk[0] * b_chunk[0]
            + a_chunk[1] * b_chunk[1]
            + a_chunk[2] * b_chunk[2]
            + a_chunk[3] * b_chunk[3];

        dot1 += a_chunk[4] * b_chunk[4]
            + a_chunk[5] * b_chunk[5]
            + a_chunk[6] * b_chunk[6]
            + a_chunk[7] * b_chunk[7];
    }

    let offset = a.len() - remainder.len();
    for (x, y) in remainder.iter().zip(&b[offset..]) {
        dot0 += x * y;
    }

    dot0 + dot1
}

#[inline]
pub fn norm_squared(v: &[f32]) -> f32 {
    dot_product(v, v)
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    norm_squared(v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_with_remainder() {
        let a: Vec<f32> = (1..=11).map(|x| x as f32).collect();
        let b = vec![1.0f32; 11];
        assert!((dot_product(&a, &b) - 66.0).abs() < 1e-4);
    }

    #[test]
    fn test_dot_product_length_mismatch() {
        assert_eq!(dot_product(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_norm() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(norm(&[]), 0.0);
    }
}
