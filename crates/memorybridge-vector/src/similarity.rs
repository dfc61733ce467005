//! Vector math shared by the graph builder, the ranker and the embedders.

use memorybridge_core::error::{MemoryBridgeError, Result};

/// Compute cosine similarity between two vectors.
///
/// Vectors of different length are a caller bug and fail with
/// `DimensionMismatch`. A zero-magnitude vector on either side yields
/// exactly 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MemoryBridgeError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (mag_a * mag_b))
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vector.iter_mut() {
            *val /= norm;
        }
    }
}

/// Round to 4 decimal places, ties to even on the exact binary value.
///
/// Goes through decimal formatting so that `0.03125` becomes `0.0312`, where
/// scaling by 10^4 and calling `f64::round` would give `0.0313`.
pub(crate) fn round4(value: f64) -> f64 {
    format!("{:.4}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0f32; 100];
        let b = vec![1.0f32; 100];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0f32; 100];
        let b = vec![1.0f32; 100];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&b, &a).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        let a = vec![1.0f32; 3];
        let b = vec![1.0f32; 5];
        let err = cosine_similarity(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            MemoryBridgeError::DimensionMismatch { left: 3, right: 5 }
        ));
    }

    #[test]
    fn test_cosine_similarity_empty_vectors() {
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        let sim = cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0f32; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0f32; 4]);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
        assert_eq!(round4(0.70004), 0.7);
    }

    #[test]
    fn test_round4_exact_ties_go_to_even() {
        assert_eq!(round4(0.03125), 0.0312);
        assert_eq!(round4(0.09375), 0.0938);
        assert_eq!(round4(-0.03125), -0.0312);
    }
}
