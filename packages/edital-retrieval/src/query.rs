//! Hybrid query over one processed document. Scoring runs against the
//! manifest's candidate chunks under a wall-clock deadline.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	Error, Result, RetrievalEngine,
	ranking::{self, keyword},
};
use edital_domain::{SectionType, lexicon, text};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
	pub document_id: String,
	pub text: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub hybrid_weight: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredResult {
	pub chunk_id: Uuid,
	pub text: String,
	pub hierarchy_path: String,
	pub section_type: SectionType,
	pub depth: u32,
	pub criticality: f32,
	pub document_index: u32,
	pub page_number: u32,
	pub document_type: String,
	pub vector_score: f32,
	pub keyword_score: f32,
	pub structural_boost: f32,
	pub hybrid_score: f32,
}

impl RetrievalEngine {
	pub async fn query(&self, req: QueryRequest) -> Result<Vec<ScoredResult>> {
		validate_query_request(&req)?;

		let started = Instant::now();
		let deadline = started + Duration::from_millis(self.cfg.retrieval.query_deadline_ms);
		let top_k = req.top_k.unwrap_or(self.cfg.retrieval.top_k) as usize;
		let hybrid_weight = req.hybrid_weight.unwrap_or(self.cfg.retrieval.hybrid_weight);
		// A failed query embedding is fatal, even when the document turns out
		// to have no candidates.
		let query_embedding =
			self.gateway.embed_query(&self.cfg.providers.embedding, &req.text).await?;
		let candidate_ids = self.gateway.candidate_ids(&req.document_id).await?;

		if candidate_ids.is_empty() {
			return Ok(Vec::new());
		}

		let chunks = self.gateway.fetch_chunks(&candidate_ids).await?;

		if chunks.len() < candidate_ids.len() {
			tracing::warn!(
				document_id = %req.document_id,
				expected = candidate_ids.len(),
				found = chunks.len(),
				"Some manifest chunks are missing from the store, ranking the rest."
			);
		}

		let folded_query = text::fold(req.text.trim());
		let terms = keyword::expand_terms(&req.text, &self.cfg.ranking.keyword);
		let topic = lexicon::infer_topic(&folded_query);
		let mut results = Vec::with_capacity(chunks.len());

		for mut chunk in chunks {
			if Instant::now() >= deadline {
				let elapsed_ms = started.elapsed().as_millis() as u64;

				tracing::warn!(
					document_id = %req.document_id,
					elapsed_ms,
					scored = results.len(),
					"Query deadline exceeded while scoring."
				);

				return Err(Error::QueryTimeout { elapsed_ms });
			}

			if let Some(embedding) = &chunk.embedding {
				self.cache.put_embedding(chunk.id, embedding.clone());
			} else {
				chunk.embedding = self.cache.embedding(&chunk.id);
			}

			let scores = ranking::score_chunk(
				&chunk,
				&query_embedding,
				&folded_query,
				&terms,
				topic,
				hybrid_weight,
				&self.cfg.ranking,
				&self.cache,
			);

			results.push(ScoredResult {
				chunk_id: chunk.id,
				text: chunk.text,
				hierarchy_path: chunk.hierarchy_path,
				section_type: chunk.section_type,
				depth: chunk.depth,
				criticality: chunk.criticality,
				document_index: chunk.document_index,
				page_number: chunk.page_number,
				document_type: chunk.document_type,
				vector_score: scores.vector,
				keyword_score: scores.keyword,
				structural_boost: scores.boost,
				hybrid_score: scores.hybrid,
			});
		}

		// Stable sort. Candidates arrive in manifest order, so score ties keep
		// document order.
		results.sort_by(|a, b| ranking::cmp_f32_desc(a.hybrid_score, b.hybrid_score));
		results.truncate(top_k);

		Ok(results)
	}
}

fn validate_query_request(req: &QueryRequest) -> Result<()> {
	if req.document_id.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "Document id is required.".to_string() });
	}
	if req.text.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "Query text is empty.".to_string() });
	}
	if req.top_k == Some(0) {
		return Err(Error::InvalidRequest { message: "top_k must be at least 1.".to_string() });
	}
	if let Some(weight) = req.hybrid_weight
		&& !(0.0..=1.0).contains(&weight)
	{
		return Err(Error::InvalidRequest {
			message: "hybrid_weight must be between 0 and 1.".to_string(),
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request() -> QueryRequest {
		QueryRequest {
			document_id: "doc-1".to_string(),
			text: "qual o valor estimado".to_string(),
			top_k: None,
			hybrid_weight: None,
		}
	}

	#[test]
	fn accepts_default_and_boundary_weights() {
		assert!(validate_query_request(&request()).is_ok());

		for weight in [0.0, 0.5, 1.0] {
			let req = QueryRequest { hybrid_weight: Some(weight), ..request() };

			assert!(validate_query_request(&req).is_ok());
		}
	}

	#[test]
	fn rejects_blank_text_and_zero_top_k() {
		let blank = QueryRequest { text: " \n".to_string(), ..request() };
		let zero = QueryRequest { top_k: Some(0), ..request() };

		assert!(matches!(validate_query_request(&blank), Err(Error::InvalidRequest { .. })));
		assert!(matches!(validate_query_request(&zero), Err(Error::InvalidRequest { .. })));
	}

	#[test]
	fn rejects_out_of_range_weights() {
		for weight in [-0.1, 1.5, f32::NAN] {
			let req = QueryRequest { hybrid_weight: Some(weight), ..request() };

			assert!(matches!(validate_query_request(&req), Err(Error::InvalidRequest { .. })));
		}
	}
}
