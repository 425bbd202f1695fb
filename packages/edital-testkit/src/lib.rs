//! In-memory doubles for engine and endpoint tests. [`MemoryIndex`] stands in
//! for the Qdrant store, the embedding doubles stand in for the HTTP provider,
//! and [`test_config`] wires both together with fast retry timings.

use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::Map;
use uuid::Uuid;

use edital_config::{
	Chunking, Config, EmbeddingProviderConfig, Providers, Qdrant, Ranking, Retrieval, Service,
	Storage, UpsertRetry,
};
use edital_domain::{Chunk, DocumentManifest, SourceText, text};
use edital_retrieval::{BoxFuture, ChunkStore, EmbeddingProvider, Error, Result};

/// One marker term per embedding dimension. [`MarkerEmbedding`] counts these
/// in the folded text, so chunks sharing vocabulary with a query land near it
/// in cosine space while unrelated chunks stay orthogonal.
pub const MARKER_TERMS: &[&str] =
	&["valor", "prazo", "objeto", "habilitacao", "participacao", "entrega", "garantia", "pagamento"];

/// Chunk store double backed by two hash maps. Upsert calls are counted and
/// can be made to fail a set number of times to drive the retry path.
#[derive(Default)]
pub struct MemoryIndex {
	chunks: Mutex<HashMap<Uuid, Chunk>>,
	manifests: Mutex<HashMap<String, DocumentManifest>>,
	upsert_calls: AtomicUsize,
	failing_upserts: AtomicUsize,
}
impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the next `count` upsert calls fail before storing anything.
	pub fn fail_next_upserts(&self, count: usize) {
		self.failing_upserts.store(count, Ordering::SeqCst);
	}

	pub fn upsert_call_count(&self) -> usize {
		self.upsert_calls.load(Ordering::SeqCst)
	}

	pub fn chunk_count(&self) -> usize {
		let chunks = self.chunks.lock().unwrap_or_else(|err| err.into_inner());

		chunks.len()
	}

	pub fn stored_chunk(&self, id: &Uuid) -> Option<Chunk> {
		let chunks = self.chunks.lock().unwrap_or_else(|err| err.into_inner());

		chunks.get(id).cloned()
	}

	pub fn stored_manifest(&self, document_id: &str) -> Option<DocumentManifest> {
		let manifests = self.manifests.lock().unwrap_or_else(|err| err.into_inner());

		manifests.get(document_id).cloned()
	}
}
impl ChunkStore for MemoryIndex {
	fn upsert_chunks<'a>(&'a self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.upsert_calls.fetch_add(1, Ordering::SeqCst);

			if self
				.failing_upserts
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
				.is_ok()
			{
				return Err(Error::Storage { message: "Injected upsert failure.".to_string() });
			}

			let mut stored = self.chunks.lock().unwrap_or_else(|err| err.into_inner());

			for chunk in chunks {
				stored.insert(chunk.id, chunk.clone());
			}

			Ok(())
		})
	}

	fn fetch_chunks<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Chunk>>> {
		Box::pin(async move {
			let stored = self.chunks.lock().unwrap_or_else(|err| err.into_inner());

			Ok(ids.iter().filter_map(|id| stored.get(id).cloned()).collect())
		})
	}

	fn fetch_manifest<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, Result<Option<DocumentManifest>>> {
		Box::pin(async move {
			let manifests = self.manifests.lock().unwrap_or_else(|err| err.into_inner());

			Ok(manifests.get(document_id).cloned())
		})
	}

	fn store_manifest<'a>(&'a self, manifest: &'a DocumentManifest) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut manifests = self.manifests.lock().unwrap_or_else(|err| err.into_inner());

			manifests.insert(manifest.document_id.clone(), manifest.clone());

			Ok(())
		})
	}

	fn delete_document_chunks<'a>(&'a self, document_id: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut stored = self.chunks.lock().unwrap_or_else(|err| err.into_inner());

			stored.retain(|_, chunk| chunk.document_id != document_id);

			Ok(())
		})
	}
}

pub fn marker_vector(raw: &str, dimensions: usize) -> Vec<f32> {
	let folded = text::fold(raw);

	(0..dimensions)
		.map(|dim| MARKER_TERMS.get(dim).map_or(0.0, |term| folded.matches(term).count() as f32))
		.collect()
}

/// Deterministic embedding double built on [`marker_vector`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerEmbedding;

impl EmbeddingProvider for MarkerEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, edital_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts.iter().map(|text| marker_vector(text, cfg.dimensions as usize)).collect())
		})
	}
}

/// Embedding double whose every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingEmbedding;

impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, edital_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Err(edital_providers::Error::InvalidResponse {
				message: "Injected provider failure.".to_string(),
			})
		})
	}
}

/// Embedding double that rejects batch calls outright and single calls whose
/// text contains the poison marker. Everything else embeds like
/// [`MarkerEmbedding`], which is exactly the shape that drives the per-chunk
/// fallback with a partial failure.
#[derive(Clone, Debug)]
pub struct PoisonedEmbedding {
	poison: String,
}
impl PoisonedEmbedding {
	pub fn new(poison: &str) -> Self {
		Self { poison: poison.to_string() }
	}
}
impl EmbeddingProvider for PoisonedEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, edital_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			if texts.len() > 1 || texts.iter().any(|text| text.contains(&self.poison)) {
				return Err(edital_providers::Error::InvalidResponse {
					message: "Injected provider failure.".to_string(),
				});
			}

			Ok(texts.iter().map(|text| marker_vector(text, cfg.dimensions as usize)).collect())
		})
	}
}

/// Configuration for in-memory tests. Embedding dimensions follow
/// [`MARKER_TERMS`] and retry backoff is shortened to keep failure tests fast.
pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "warn".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://localhost:6334".to_string(),
				collection: "edital_test".to_string(),
				vector_dim: MARKER_TERMS.len() as u32,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "marker-test".to_string(),
				dimensions: MARKER_TERMS.len() as u32,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		chunking: Chunking::default(),
		retrieval: Retrieval {
			retry: UpsertRetry { max_attempts: 3, base_backoff_ms: 1, max_backoff_ms: 5 },
			..Retrieval::default()
		},
		ranking: Ranking::default(),
	}
}

pub fn source_text(text: &str) -> SourceText {
	SourceText {
		text: text.to_string(),
		document_index: 0,
		page_number: 1,
		document_type: "edital".to_string(),
	}
}

/// A small but fully structured tender notice. Every top section carries a
/// numbered upper-case heading, items and subitems follow the `N.N` and
/// `N.N.N` numbering, and the wording exercises the criticality keywords.
pub fn sample_edital() -> String {
	[
		"EDITAL DE PREGÃO ELETRÔNICO Nº 14/2025",
		"",
		"1. DO OBJETO",
		"1.1. A presente licitação tem por objeto a contratação de empresa especializada na \
		 prestação de serviços de limpeza e conservação predial, incluindo o fornecimento de \
		 materiais e equipamentos, conforme especificações constantes do Termo de Referência.",
		"1.2. Em caso de divergência entre as especificações do Termo de Referência e as deste \
		 Edital, prevalecem as do Termo de Referência.",
		"",
		"2. DO VALOR ESTIMADO",
		"2.1. O valor total estimado da contratação é de R$ 1.250.000,00 (um milhão, duzentos e \
		 cinquenta mil reais), conforme pesquisa de preços anexa aos autos do processo.",
		"2.2. Os pagamentos serão efetuados mensalmente, mediante apresentação de nota fiscal \
		 atestada pelo fiscal do contrato.",
		"",
		"3. DOS PRAZOS",
		"3.1. O prazo de vigência do contrato é de 12 (doze) meses, contados da data de sua \
		 assinatura, prorrogável na forma da lei.",
		"3.1.1. A prorrogação depende de manifestação expressa da contratada com antecedência \
		 mínima de 60 (sessenta) dias do término da vigência.",
		"3.2. O prazo de entrega dos materiais é de 15 (quinze) dias úteis contados da emissão \
		 da ordem de serviço.",
		"",
		"4. DA HABILITAÇÃO",
		"4.1. Para fins de habilitação jurídica, os licitantes deverão apresentar ato \
		 constitutivo, estatuto ou contrato social em vigor, devidamente registrado.",
		"4.2. A qualificação econômico-financeira será comprovada mediante certidão negativa de \
		 falência e balanço patrimonial do último exercício social.",
		"",
	]
	.join("\n")
}
