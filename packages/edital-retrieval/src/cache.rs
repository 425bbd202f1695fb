use std::{collections::HashMap, sync::RwLock};

use uuid::Uuid;

/// Process-local memoization owned by one engine instance. Two maps: chunk id
/// to embedding, and a composite query/chunk key to the computed keyword
/// score. No eviction, only `clear`; both maps take concurrent readers while
/// one writer populates them.
pub struct RetrievalCache {
	embeddings: RwLock<HashMap<Uuid, Vec<f32>>>,
	keyword_scores: RwLock<HashMap<String, f32>>,
}
impl RetrievalCache {
	pub fn new() -> Self {
		Self {
			embeddings: RwLock::new(HashMap::new()),
			keyword_scores: RwLock::new(HashMap::new()),
		}
	}

	pub fn embedding(&self, chunk_id: &Uuid) -> Option<Vec<f32>> {
		let embeddings = self.embeddings.read().unwrap_or_else(|err| err.into_inner());

		embeddings.get(chunk_id).cloned()
	}

	pub fn put_embedding(&self, chunk_id: Uuid, vector: Vec<f32>) {
		let mut embeddings = self.embeddings.write().unwrap_or_else(|err| err.into_inner());

		embeddings.insert(chunk_id, vector);
	}

	pub fn keyword_score(&self, key: &str) -> Option<f32> {
		let scores = self.keyword_scores.read().unwrap_or_else(|err| err.into_inner());

		scores.get(key).copied()
	}

	pub fn put_keyword_score(&self, key: String, score: f32) {
		let mut scores = self.keyword_scores.write().unwrap_or_else(|err| err.into_inner());

		scores.insert(key, score);
	}

	pub fn embedding_count(&self) -> usize {
		let embeddings = self.embeddings.read().unwrap_or_else(|err| err.into_inner());

		embeddings.len()
	}

	pub fn clear(&self) {
		{
			let mut embeddings = self.embeddings.write().unwrap_or_else(|err| err.into_inner());

			embeddings.clear();
		}

		let mut scores = self.keyword_scores.write().unwrap_or_else(|err| err.into_inner());

		scores.clear();
	}
}
impl Default for RetrievalCache {
	fn default() -> Self {
		Self::new()
	}
}

pub fn keyword_score_key(folded_query: &str, chunk_id: &Uuid) -> String {
	let raw = format!("{folded_query}\u{1f}{chunk_id}");

	blake3::hash(raw.as_bytes()).to_hex().to_string()
}
