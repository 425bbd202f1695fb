pub mod cache;
pub mod gateway;
pub mod process;
pub mod query;
pub mod ranking;

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

pub use cache::RetrievalCache;
use edital_config::{Config, EmbeddingProviderConfig};
use edital_domain::{Chunk, DocumentManifest};
use edital_providers::embedding;
use edital_storage::qdrant::QdrantIndex;
pub use gateway::{Gateway, SaveOutcome};
pub use process::{ProcessReport, ProcessRequest};
pub use query::{QueryRequest, ScoredResult};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub enum Error {
	InvalidRequest { message: String },
	QueryEmbedding { message: String },
	QueryTimeout { elapsed_ms: u64 },
	Provider { message: String },
	Storage { message: String },
}
impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::QueryEmbedding { message } => {
				write!(f, "Failed to embed the query: {message}")
			},
			Self::QueryTimeout { elapsed_ms } => {
				write!(f, "Query aborted after {elapsed_ms} ms.")
			},
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}
impl std::error::Error for Error {}
impl From<edital_storage::Error> for Error {
	fn from(err: edital_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<edital_providers::Error> for Error {
	fn from(err: edital_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, edital_providers::Result<Vec<Vec<f32>>>>;
}

/// Persistence seam for chunk records and document manifests. The production
/// implementation is [`QdrantIndex`]; tests swap in an in-memory store.
pub trait ChunkStore
where
	Self: Send + Sync,
{
	fn upsert_chunks<'a>(&'a self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>>;

	fn fetch_chunks<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Chunk>>>;

	fn fetch_manifest<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, Result<Option<DocumentManifest>>>;

	fn store_manifest<'a>(&'a self, manifest: &'a DocumentManifest) -> BoxFuture<'a, Result<()>>;

	fn delete_document_chunks<'a>(&'a self, document_id: &'a str) -> BoxFuture<'a, Result<()>>;
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, edital_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ChunkStore for QdrantIndex {
	fn upsert_chunks<'a>(&'a self, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.upsert_chunks(chunks).await.map_err(Error::from) })
	}

	fn fetch_chunks<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Chunk>>> {
		Box::pin(async move { self.fetch_chunks(ids).await.map_err(Error::from) })
	}

	fn fetch_manifest<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, Result<Option<DocumentManifest>>> {
		Box::pin(async move { self.fetch_manifest(document_id).await.map_err(Error::from) })
	}

	fn store_manifest<'a>(&'a self, manifest: &'a DocumentManifest) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.store_manifest(manifest).await.map_err(Error::from) })
	}

	fn delete_document_chunks<'a>(&'a self, document_id: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.delete_document_chunks(document_id).await.map_err(Error::from) })
	}
}

/// Owns the scoring configuration, the gateway to embeddings and storage, the
/// per-instance cache, and the per-document processing locks.
pub struct RetrievalEngine {
	pub cfg: Config,
	pub gateway: Gateway,
	pub cache: RetrievalCache,
	locks: process::DocumentLocks,
}
impl RetrievalEngine {
	pub fn new(cfg: Config, store: Arc<dyn ChunkStore>) -> Self {
		Self::with_embedding(cfg, store, Arc::new(DefaultEmbedding))
	}

	pub fn with_embedding(
		cfg: Config,
		store: Arc<dyn ChunkStore>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self {
			cfg,
			gateway: Gateway::new(store, embedding),
			cache: RetrievalCache::new(),
			locks: process::DocumentLocks::new(),
		}
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	pub async fn is_document_processed(&self, document_id: &str) -> Result<bool> {
		self.gateway.is_document_processed(document_id).await
	}

	/// Warms the embedding cache with every stored embedding of a document.
	/// Returns how many embeddings were cached.
	pub async fn load_embeddings(&self, document_id: &str) -> Result<usize> {
		self.gateway.load_embeddings(document_id, &self.cache).await
	}
}
