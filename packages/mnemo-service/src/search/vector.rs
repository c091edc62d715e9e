use std::cmp::Ordering;

use mnemo_storage::models::StoredEmbedding;

/// `dot(a, b) / (|a| * |b|)`, or `0.0` when either norm is zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	let denom = norm_a.sqrt() * norm_b.sqrt();

	if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Scores every candidate against `query` and keeps the best `limit`, highest first.
///
/// Candidates whose dimensionality differs from the query are left out.
pub fn rank(query: &[f32], candidates: &[StoredEmbedding], limit: usize) -> Vec<(i64, f32)> {
	let mut scored: Vec<(i64, f32)> = candidates
		.iter()
		.filter(|candidate| candidate.vector.len() == query.len())
		.map(|candidate| (candidate.memory_id, cosine_similarity(query, &candidate.vector)))
		.collect();

	scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
	scored.truncate(limit);

	scored
}

#[cfg(test)]
mod tests {
	use mnemo_storage::models::StoredEmbedding;

	use crate::search::vector::{cosine_similarity, rank};

	fn stored(memory_id: i64, vector: Vec<f32>) -> StoredEmbedding {
		StoredEmbedding { memory_id, model: "test".to_string(), vector }
	}

	#[test]
	fn cosine_similarity_identical_vectors() {
		let v = [0.3, -1.2, 4.5];

		assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn cosine_similarity_zero_vector() {
		assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
	}

	#[test]
	fn cosine_similarity_orthogonal_and_opposite() {
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
		assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
	}

	#[test]
	fn rank_orders_by_similarity_and_skips_foreign_dimensions() {
		let candidates = vec![
			stored(1, vec![0.0, 1.0]),
			stored(2, vec![1.0, 0.1]),
			stored(3, vec![1.0, 0.0, 0.0]),
			stored(4, vec![1.0, 1.0]),
		];
		let ranked = rank(&[1.0, 0.0], &candidates, 2);

		assert_eq!(ranked.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![2, 4]);
	}
}
