//! Shared access layer in front of the embedding provider and the chunk
//! store. Ingestion tolerates partial failure here; query-side calls do not.

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ChunkStore, EmbeddingProvider, Error, Result, cache::RetrievalCache};
use edital_config::{EmbeddingProviderConfig, Retrieval, UpsertRetry};
use edital_domain::{Chunk, DocumentManifest};

/// What [`Gateway::save_chunks`] managed to persist.
#[derive(Clone, Debug, Default)]
pub struct SaveOutcome {
	pub saved_ids: Vec<Uuid>,
	pub failed: usize,
}

pub struct Gateway {
	store: Arc<dyn ChunkStore>,
	embedding: Arc<dyn EmbeddingProvider>,
}
impl Gateway {
	pub fn new(store: Arc<dyn ChunkStore>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { store, embedding }
	}

	/// Attaches embeddings to `chunks` in place and returns how many chunks
	/// ended up without one.
	///
	/// A failed batch call degrades to one call per chunk so a single bad
	/// input cannot sink the whole document. Vectors whose dimension differs
	/// from the configured one are discarded rather than stored.
	pub async fn generate_embeddings(
		&self,
		cfg: &EmbeddingProviderConfig,
		chunks: &mut [Chunk],
	) -> usize {
		if chunks.is_empty() {
			return 0;
		}

		let texts = chunks.iter().map(|chunk| chunk.text.clone()).collect::<Vec<_>>();

		match self.embedding.embed(cfg, &texts).await {
			Ok(vectors) => {
				let mut failed = 0;

				for (chunk, vector) in chunks.iter_mut().zip(vectors) {
					if vector.len() == cfg.dimensions as usize {
						chunk.embedding = Some(vector);
					} else {
						tracing::warn!(
							chunk_id = %chunk.id,
							dimension = vector.len(),
							expected = cfg.dimensions,
							"Discarding embedding with unexpected dimension."
						);

						failed += 1;
					}
				}

				failed
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Batch embedding failed, falling back to per-chunk requests."
				);

				let mut failed = 0;

				for chunk in chunks.iter_mut() {
					let text = [chunk.text.clone()];

					match self.embedding.embed(cfg, &text).await {
						Ok(mut vectors) => match vectors.pop() {
							Some(vector) if vector.len() == cfg.dimensions as usize =>
								chunk.embedding = Some(vector),
							Some(vector) => {
								tracing::warn!(
									chunk_id = %chunk.id,
									dimension = vector.len(),
									expected = cfg.dimensions,
									"Discarding embedding with unexpected dimension."
								);

								failed += 1;
							},
							None => {
								tracing::warn!(
									chunk_id = %chunk.id,
									"Provider returned no vector for chunk."
								);

								failed += 1;
							},
						},
						Err(err) => {
							tracing::warn!(
								chunk_id = %chunk.id,
								error = %err,
								"Embedding failed for chunk, continuing without it."
							);

							failed += 1;
						},
					}
				}

				failed
			},
		}
	}

	/// Upserts chunks in batches, retrying each batch with exponential
	/// backoff. Exhausted batches are counted as failed instead of aborting
	/// the remaining ones, so the outcome is always a partial tally.
	pub async fn save_chunks(&self, cfg: &Retrieval, chunks: &[Chunk]) -> SaveOutcome {
		let mut outcome = SaveOutcome::default();

		for batch in chunks.chunks(cfg.upsert_batch_size.max(1)) {
			if self.upsert_with_retry(&cfg.retry, batch).await {
				outcome.saved_ids.extend(batch.iter().map(|chunk| chunk.id));
			} else {
				outcome.failed += batch.len();
			}
		}

		outcome
	}

	async fn upsert_with_retry(&self, retry: &UpsertRetry, batch: &[Chunk]) -> bool {
		let max_attempts = retry.max_attempts.max(1);
		let mut backoff = Duration::from_millis(retry.base_backoff_ms);

		for attempt in 1..=max_attempts {
			match self.store.upsert_chunks(batch).await {
				Ok(()) => return true,
				Err(err) => {
					if attempt == max_attempts {
						tracing::error!(
							attempts = attempt,
							batch_len = batch.len(),
							error = %err,
							"Giving up on chunk batch after final upsert attempt."
						);

						break;
					}

					tracing::warn!(
						attempt,
						error = %err,
						"Chunk upsert failed, backing off before retrying."
					);

					tokio::time::sleep(backoff).await;

					backoff = backoff
						.saturating_mul(2)
						.min(Duration::from_millis(retry.max_backoff_ms));
				},
			}
		}

		false
	}

	/// Embeds the query text. Unlike ingestion, any failure here is fatal.
	pub async fn embed_query(
		&self,
		cfg: &EmbeddingProviderConfig,
		query: &str,
	) -> Result<Vec<f32>> {
		let texts = [query.to_string()];
		let mut vectors = self
			.embedding
			.embed(cfg, &texts)
			.await
			.map_err(|err| Error::QueryEmbedding { message: err.to_string() })?;
		let Some(vector) = vectors.pop() else {
			return Err(Error::QueryEmbedding {
				message: "provider returned no vector for the query".into(),
			});
		};

		if vector.len() != cfg.dimensions as usize {
			return Err(Error::QueryEmbedding {
				message: format!(
					"provider returned a {}-dimensional vector, expected {}",
					vector.len(),
					cfg.dimensions
				),
			});
		}

		Ok(vector)
	}

	/// Warms the embedding cache from storage. Returns how many embeddings
	/// were cached; a missing manifest warms nothing.
	pub async fn load_embeddings(
		&self,
		document_id: &str,
		cache: &RetrievalCache,
	) -> Result<usize> {
		let Some(manifest) = self.store.fetch_manifest(document_id).await? else {
			return Ok(0);
		};
		let chunks = self.store.fetch_chunks(&manifest.chunk_ids).await?;
		let mut cached = 0;

		for chunk in chunks {
			if let Some(embedding) = chunk.embedding {
				cache.put_embedding(chunk.id, embedding);

				cached += 1;
			}
		}

		Ok(cached)
	}

	pub async fn is_document_processed(&self, document_id: &str) -> Result<bool> {
		let manifest = self.store.fetch_manifest(document_id).await?;

		Ok(manifest.as_ref().is_some_and(manifest_is_live))
	}

	pub async fn fetch_manifest(&self, document_id: &str) -> Result<Option<DocumentManifest>> {
		self.store.fetch_manifest(document_id).await
	}

	/// Chunk ids a query may rank, in manifest order. A missing, unprocessed,
	/// or expired manifest yields no candidates rather than an error.
	pub async fn candidate_ids(&self, document_id: &str) -> Result<Vec<Uuid>> {
		let Some(manifest) = self.store.fetch_manifest(document_id).await? else {
			tracing::debug!(document_id, "No manifest for document, nothing to rank.");

			return Ok(Vec::new());
		};

		if !manifest_is_live(&manifest) {
			tracing::debug!(
				document_id,
				state = manifest.state.as_str(),
				"Manifest is not serving queries."
			);

			return Ok(Vec::new());
		}

		Ok(manifest.chunk_ids)
	}

	pub async fn fetch_chunks(&self, ids: &[Uuid]) -> Result<Vec<Chunk>> {
		self.store.fetch_chunks(ids).await
	}

	pub async fn store_manifest(&self, manifest: &DocumentManifest) -> Result<()> {
		self.store.store_manifest(manifest).await
	}

	pub async fn delete_document_chunks(&self, document_id: &str) -> Result<()> {
		self.store.delete_document_chunks(document_id).await
	}
}

pub(crate) fn manifest_is_live(manifest: &DocumentManifest) -> bool {
	manifest.is_processed()
		&& manifest.expires_at.is_none_or(|expires_at| expires_at > OffsetDateTime::now_utc())
}
