//! Vector similarity and k-nearest-neighbour ranking.
//!
//! Brute force over every stored vector; training sets are small.

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// A candidate selected by [`k_nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the candidate in the input slice
    pub index: usize,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Rank candidates by cosine similarity to `query` and keep the best `k`.
///
/// Sorted by descending similarity; ties keep input order.
pub fn k_nearest<'a, I>(candidates: I, query: &[f32], k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<Neighbor> = candidates
        .into_iter()
        .enumerate()
        .map(|(index, v)| Neighbor {
            index,
            score: cosine_similarity(v, query),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn k_nearest_ranks_by_similarity() {
        let vectors: Vec<Vec<f32>> = vec![
            vec![0.0, 1.0, 0.0], // orthogonal
            vec![1.0, 0.0, 0.0], // identical
            vec![0.5, 0.5, 0.0], // partial
        ];
        let hits = k_nearest(vectors.iter().map(Vec::as_slice), &[1.0, 0.0, 0.0], 10);
        let order: Vec<usize> = hits.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn k_nearest_truncates_to_k() {
        let vectors: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, i as f32 * 0.1]).collect();
        let hits = k_nearest(vectors.iter().map(Vec::as_slice), &[1.0, 0.0], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 0);
    }

    #[test]
    fn k_nearest_ties_keep_input_order() {
        let vectors: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let hits = k_nearest(vectors.iter().map(Vec::as_slice), &[1.0, 0.0], 2);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 1);
    }

    #[test]
    fn k_nearest_empty() {
        let hits = k_nearest(std::iter::empty::<&[f32]>(), &[1.0], 5);
        assert!(hits.is_empty());
    }
}
