//! Document ingestion. Chunks the extracted sources, embeds them, persists
//! chunks plus manifest, and keeps concurrent requests for the same document
//! from racing each other.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{Error, Result, RetrievalEngine, gateway};
use edital_domain::{DocumentManifest, DocumentMeta, ProcessingState, SourceText};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessRequest {
	pub document_id: String,
	pub sources: Vec<SourceText>,
	#[serde(default)]
	pub reprocess: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessReport {
	/// Whether the document ended up fully queryable. Embedding failures do
	/// not unset this; lost chunk writes do.
	pub processed: bool,
	pub chunk_count: usize,
	pub failed_embeddings: usize,
	pub failed_writes: usize,
}

impl RetrievalEngine {
	pub async fn process(&self, req: ProcessRequest) -> Result<ProcessReport> {
		validate_process_request(&req)?;

		// Serializes passes over the same document. Different documents
		// proceed in parallel.
		let lock = self.locks.lock_for(&req.document_id);
		let _guard = lock.lock().await;

		if !req.reprocess
			&& let Some(manifest) = self.gateway.fetch_manifest(&req.document_id).await?
			&& gateway::manifest_is_live(&manifest)
		{
			tracing::info!(
				document_id = %req.document_id,
				chunk_count = manifest.chunk_ids.len(),
				"Document already processed, skipping."
			);

			return Ok(ProcessReport {
				processed: true,
				chunk_count: manifest.chunk_ids.len(),
				failed_embeddings: 0,
				failed_writes: 0,
			});
		}

		if req.reprocess {
			self.gateway.delete_document_chunks(&req.document_id).await?;
			self.cache.clear();
		}

		let mut manifest = DocumentManifest::new(&req.document_id, ProcessingState::Processing);

		self.gateway.store_manifest(&manifest).await?;

		let mut chunks = Vec::new();

		for source in &req.sources {
			let meta = DocumentMeta::for_source(&req.document_id, source);

			chunks.extend(edital_chunking::chunk(&source.text, &meta, &self.cfg.chunking));
		}

		let failed_embeddings =
			self.gateway.generate_embeddings(&self.cfg.providers.embedding, &mut chunks).await;
		let outcome = self.gateway.save_chunks(&self.cfg.retrieval, &chunks).await;

		manifest.chunk_ids = outcome.saved_ids;

		if outcome.failed == 0 {
			manifest.state = ProcessingState::Processed;
			manifest.expires_at =
				Some(manifest.created_at + Duration::days(self.cfg.retrieval.manifest_ttl_days));
		} else {
			manifest.state = ProcessingState::Unprocessed;
		}

		self.gateway.store_manifest(&manifest).await?;

		let report = ProcessReport {
			processed: manifest.is_processed(),
			chunk_count: manifest.chunk_ids.len(),
			failed_embeddings,
			failed_writes: outcome.failed,
		};

		tracing::info!(
			document_id = %req.document_id,
			processed = report.processed,
			chunk_count = report.chunk_count,
			failed_embeddings = report.failed_embeddings,
			failed_writes = report.failed_writes,
			"Document processing finished."
		);

		Ok(report)
	}
}

pub(crate) struct DocumentLocks {
	inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}
impl DocumentLocks {
	pub(crate) fn new() -> Self {
		Self { inner: Mutex::new(HashMap::new()) }
	}

	pub(crate) fn lock_for(&self, document_id: &str) -> Arc<tokio::sync::Mutex<()>> {
		let mut map = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		map.entry(document_id.to_string()).or_default().clone()
	}
}

fn validate_process_request(req: &ProcessRequest) -> Result<()> {
	if req.document_id.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "Document id is required.".to_string() });
	}
	if req.sources.is_empty() {
		return Err(Error::InvalidRequest { message: "Sources list is empty.".to_string() });
	}
	if req.sources.iter().all(|source| source.text.trim().is_empty()) {
		return Err(Error::InvalidRequest {
			message: "Sources contain no extractable text.".to_string(),
		});
	}

	Ok(())
}
