use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
		GetPointsBuilder, PointId, PointStruct, UpsertPointsBuilder, VectorParamsBuilder,
		VectorsOutput, point_id::PointIdOptions, vectors_output::VectorsOptions,
	},
};
use uuid::Uuid;

use edital_domain::{Chunk, DocumentManifest};

use crate::{Result, models};

pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &edital_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let collection = CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
			VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
		);

		self.client.create_collection(collection).await?;

		Ok(())
	}

	/// Upserts one batch of chunks. Chunks without an embedding are stored
	/// under a zero vector with `has_embedding = false`, so reads can tell a
	/// missing embedding from a real one.
	pub async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() {
			return Ok(());
		}

		let mut points = Vec::with_capacity(chunks.len());

		for chunk in chunks {
			let payload = Payload::from(models::chunk_payload(chunk)?);
			let vector = chunk
				.embedding
				.clone()
				.unwrap_or_else(|| vec![0.0; self.vector_dim as usize]);

			points.push(PointStruct::new(chunk.id.to_string(), vector, payload));
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Fetches chunk records by id, preserving the requested order. Ids with
	/// no stored point are skipped, malformed points are skipped with a
	/// warning.
	pub async fn fetch_chunks(&self, ids: &[Uuid]) -> Result<Vec<Chunk>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let point_ids: Vec<PointId> = ids.iter().map(|id| PointId::from(id.to_string())).collect();
		let request = GetPointsBuilder::new(self.collection.clone(), point_ids)
			.with_payload(true)
			.with_vectors(true);
		let response = self.client.get_points(request).await?;
		let mut by_id: HashMap<Uuid, Chunk> = HashMap::with_capacity(response.result.len());

		for point in &response.result {
			let Some(id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!("Skipping chunk point without a UUID id.");

				continue;
			};
			let vector = point.vectors.as_ref().and_then(vector_data);

			match models::chunk_from_parts(id, &point.payload, vector) {
				Some(chunk) => {
					by_id.insert(id, chunk);
				},
				None => {
					tracing::warn!(chunk_id = %id, "Skipping chunk point with malformed payload.");
				},
			}
		}

		Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
	}

	pub async fn fetch_manifest(&self, document_id: &str) -> Result<Option<DocumentManifest>> {
		let id = models::manifest_point_id(document_id);
		let request =
			GetPointsBuilder::new(self.collection.clone(), vec![PointId::from(id.to_string())])
				.with_payload(true)
				.with_vectors(false);
		let response = self.client.get_points(request).await?;
		let Some(point) = response.result.first() else {
			return Ok(None);
		};
		let Some(manifest) = models::manifest_from_payload(&point.payload) else {
			tracing::warn!(document_id = %document_id, "Stored manifest payload is malformed.");

			return Ok(None);
		};

		Ok(Some(manifest))
	}

	pub async fn store_manifest(&self, manifest: &DocumentManifest) -> Result<()> {
		let payload = Payload::from(models::manifest_payload(manifest)?);
		let id = models::manifest_point_id(&manifest.document_id);
		let point =
			PointStruct::new(id.to_string(), vec![0.0; self.vector_dim as usize], payload);
		let upsert = UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Removes a document's chunk points, leaving the manifest point to be
	/// overwritten by the caller once new chunks are saved.
	pub async fn delete_document_chunks(&self, document_id: &str) -> Result<()> {
		let filter = Filter::must([
			Condition::matches("document_id", document_id.to_string()),
			Condition::matches("kind", models::KIND_CHUNK.to_string()),
		]);
		let delete =
			DeletePointsBuilder::new(self.collection.clone()).points(filter).wait(true);

		self.client.delete_points(delete).await?;

		Ok(())
	}
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn vector_data(vectors: &VectorsOutput) -> Option<Vec<f32>> {
	match &vectors.vectors_options {
		Some(VectorsOptions::Vector(vector)) => Some(vector.data.clone()),
		_ => None,
	}
}
