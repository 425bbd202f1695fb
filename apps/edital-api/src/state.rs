use std::sync::Arc;

use edital_retrieval::RetrievalEngine;
use edital_storage::qdrant::QdrantIndex;

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<RetrievalEngine>,
}
impl AppState {
	pub async fn new(config: edital_config::Config) -> color_eyre::Result<Self> {
		let index = QdrantIndex::new(&config.storage.qdrant)?;

		index.ensure_collection().await?;

		let engine = RetrievalEngine::new(config, Arc::new(index));

		Ok(Self { engine: Arc::new(engine) })
	}
}
