use edital_domain::Chunk;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DimensionMismatch {
	pub left: usize,
	pub right: usize,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
	if a.len() != b.len() {
		return Err(DimensionMismatch { left: a.len(), right: b.len() });
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return Ok(0.0);
	}

	Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Similarity clamped to `[0, 1]`-ish ranking use: negative cosine floors at
/// zero, a missing embedding scores zero, and a stored vector whose dimension
/// disagrees with the query scores zero with a warning instead of failing the
/// whole query.
pub fn vector_score(query_embedding: &[f32], chunk: &Chunk) -> f32 {
	let Some(embedding) = chunk.embedding.as_deref() else {
		return 0.0;
	};

	match cosine_similarity(query_embedding, embedding) {
		Ok(similarity) => similarity.max(0.0),
		Err(mismatch) => {
			tracing::warn!(
				chunk_id = %chunk.id,
				query_dim = mismatch.left,
				chunk_dim = mismatch.right,
				"Embedding dimension mismatch, scoring chunk as zero."
			);

			0.0
		},
	}
}
