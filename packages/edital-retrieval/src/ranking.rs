pub mod boost;
pub mod keyword;
pub mod vector;

use std::cmp::Ordering;

use edital_config::Ranking;
use edital_domain::{Chunk, lexicon::QueryTopic};

use crate::cache::{self, RetrievalCache};
use keyword::WeightedTerm;

#[derive(Clone, Copy, Debug)]
pub struct ChunkScores {
	pub vector: f32,
	pub keyword: f32,
	pub boost: f32,
	pub hybrid: f32,
}

pub fn compose_hybrid(vector: f32, keyword: f32, boost: f32, hybrid_weight: f32) -> f32 {
	hybrid_weight * vector + (1.0 - hybrid_weight) * keyword + boost
}

/// Scores one candidate chunk. The keyword score is memoized per query and
/// chunk in the engine cache; vector and boost components are cheap enough to
/// recompute.
pub fn score_chunk(
	chunk: &Chunk,
	query_embedding: &[f32],
	folded_query: &str,
	terms: &[WeightedTerm],
	topic: Option<QueryTopic>,
	hybrid_weight: f32,
	cfg: &Ranking,
	cache: &RetrievalCache,
) -> ChunkScores {
	let vector = vector::vector_score(query_embedding, chunk);
	let key = cache::keyword_score_key(folded_query, &chunk.id);
	let keyword = match cache.keyword_score(&key) {
		Some(score) => score,
		None => {
			let score = keyword::keyword_score(&chunk.text, terms, &cfg.keyword);

			cache.put_keyword_score(key, score);

			score
		},
	};
	let boost = boost::structural_boost(chunk, topic, &cfg.boost);
	let hybrid = compose_hybrid(vector, keyword, boost, hybrid_weight);

	ChunkScores { vector, keyword, boost, hybrid }
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hybrid_weight_blends_vector_and_keyword() {
		let score = compose_hybrid(0.9, 0.4, 0.1, 0.7);

		assert!((score - (0.63 + 0.12 + 0.1)).abs() < 1e-6);
	}

	#[test]
	fn weight_one_excludes_the_keyword_term() {
		assert!((compose_hybrid(0.8, 0.9, 0.2, 1.0) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn weight_zero_excludes_the_vector_term() {
		assert!((compose_hybrid(0.8, 0.9, 0.2, 0.0) - 1.1).abs() < 1e-6);
	}

	#[test]
	fn keyword_heavy_chunk_outranks_vector_heavy_chunk_at_default_weight() {
		let a = compose_hybrid(0.9, 0.0, 0.1, 0.7);
		let b = compose_hybrid(0.1, 1.0, 0.5, 0.7);

		assert!((a - 0.73).abs() < 1e-6);
		assert!((b - 0.87).abs() < 1e-6);

		let mut order = vec![("a", a), ("b", b)];

		order.sort_by(|left, right| cmp_f32_desc(left.1, right.1));

		assert_eq!(order[0].0, "b");
	}

	#[test]
	fn descending_comparator_sinks_nan() {
		let mut values = vec![0.2, f32::NAN, 0.8];

		values.sort_by(|a, b| cmp_f32_desc(*a, *b));

		assert_eq!(values[0], 0.8);
		assert_eq!(values[1], 0.2);
		assert!(values[2].is_nan());
	}
}
