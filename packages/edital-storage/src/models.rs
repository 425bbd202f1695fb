use std::collections::HashMap;

use qdrant_client::qdrant::{Value, value::Kind};
use serde_json::Value as JsonValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use edital_domain::{Chunk, DocumentManifest, ProcessingState, SectionType};

use crate::Result;

pub const KIND_CHUNK: &str = "chunk";
pub const KIND_MANIFEST: &str = "manifest";

/// One manifest point per document, addressed deterministically so stores and
/// loads hit the same point without a lookup.
pub fn manifest_point_id(document_id: &str) -> Uuid {
	let name = format!("manifest:{document_id}");

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

pub fn chunk_payload(chunk: &Chunk) -> Result<HashMap<String, Value>> {
	let mut payload = HashMap::new();

	payload.insert("kind".to_string(), Value::from(KIND_CHUNK.to_string()));
	payload.insert("text".to_string(), Value::from(chunk.text.clone()));
	payload.insert("document_id".to_string(), Value::from(chunk.document_id.clone()));
	payload.insert("document_index".to_string(), Value::from(chunk.document_index as i64));
	payload.insert("page_number".to_string(), Value::from(chunk.page_number as i64));
	payload.insert("document_type".to_string(), Value::from(chunk.document_type.clone()));
	payload.insert("hierarchy_path".to_string(), Value::from(chunk.hierarchy_path.clone()));
	payload.insert("depth".to_string(), Value::from(chunk.depth as i64));
	payload.insert("criticality".to_string(), Value::from(chunk.criticality as f64));
	payload.insert("section_type".to_string(), Value::from(chunk.section_type.as_str().to_string()));
	payload.insert("created_at".to_string(), Value::from(chunk.created_at.format(&Rfc3339)?));
	payload.insert(
		"original_section_count".to_string(),
		Value::from(chunk.original_section_count as i64),
	);
	payload.insert("has_embedding".to_string(), Value::from(chunk.embedding.is_some()));

	Ok(payload)
}

pub fn chunk_from_parts(
	id: Uuid,
	payload: &HashMap<String, Value>,
	vector: Option<Vec<f32>>,
) -> Option<Chunk> {
	let embedding = if payload_bool(payload, "has_embedding")? { vector } else { None };

	Some(Chunk {
		id,
		text: payload_string(payload, "text")?,
		embedding,
		document_id: payload_string(payload, "document_id")?,
		document_index: payload_u32(payload, "document_index")?,
		page_number: payload_u32(payload, "page_number")?,
		document_type: payload_string(payload, "document_type")?,
		hierarchy_path: payload_string(payload, "hierarchy_path")?,
		depth: payload_u32(payload, "depth")?,
		criticality: payload_f32(payload, "criticality")?,
		section_type: SectionType::parse(payload_string(payload, "section_type")?.as_str())?,
		created_at: payload_rfc3339(payload, "created_at")?,
		original_section_count: payload_u32(payload, "original_section_count")?,
	})
}

pub fn manifest_payload(manifest: &DocumentManifest) -> Result<HashMap<String, Value>> {
	let chunk_ids = JsonValue::Array(
		manifest.chunk_ids.iter().map(|id| JsonValue::String(id.to_string())).collect(),
	);
	let mut payload = HashMap::new();

	payload.insert("kind".to_string(), Value::from(KIND_MANIFEST.to_string()));
	payload.insert("document_id".to_string(), Value::from(manifest.document_id.clone()));
	payload.insert("chunk_ids".to_string(), Value::from(chunk_ids));
	payload.insert("state".to_string(), Value::from(manifest.state.as_str().to_string()));
	payload.insert("created_at".to_string(), Value::from(manifest.created_at.format(&Rfc3339)?));
	payload.insert(
		"expires_at".to_string(),
		Value::from(match manifest.expires_at {
			Some(ts) => JsonValue::String(ts.format(&Rfc3339)?),
			None => JsonValue::Null,
		}),
	);

	Ok(payload)
}

pub fn manifest_from_payload(payload: &HashMap<String, Value>) -> Option<DocumentManifest> {
	let state = ProcessingState::parse(payload_string(payload, "state")?.as_str())?;
	let chunk_ids = payload_uuid_list(payload, "chunk_ids")?;

	Some(DocumentManifest {
		document_id: payload_string(payload, "document_id")?,
		chunk_ids,
		state,
		created_at: payload_rfc3339(payload, "created_at")?,
		expires_at: payload_rfc3339(payload, "expires_at"),
	})
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

pub fn payload_u32(payload: &HashMap<String, Value>, key: &str) -> Option<u32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => u32::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) =>
			if value.fract() == 0.0 {
				u32::try_from(*value as i64).ok()
			} else {
				None
			},
		_ => None,
	}
}

pub fn payload_f32(payload: &HashMap<String, Value>, key: &str) -> Option<f32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::DoubleValue(value)) => Some(*value as f32),
		Some(Kind::IntegerValue(value)) => Some(*value as f32),
		_ => None,
	}
}

pub fn payload_bool(payload: &HashMap<String, Value>, key: &str) -> Option<bool> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::BoolValue(value)) => Some(*value),
		_ => None,
	}
}

pub fn payload_rfc3339(payload: &HashMap<String, Value>, key: &str) -> Option<OffsetDateTime> {
	let text = payload_string(payload, key)?;

	OffsetDateTime::parse(text.as_str(), &Rfc3339).ok()
}

pub fn payload_uuid_list(payload: &HashMap<String, Value>, key: &str) -> Option<Vec<Uuid>> {
	let value = payload.get(key)?;
	let Some(Kind::ListValue(list)) = &value.kind else { return None };
	let mut out = Vec::with_capacity(list.values.len());

	for entry in &list.values {
		let Some(Kind::StringValue(text)) = &entry.kind else { return None };

		out.push(Uuid::parse_str(text).ok()?);
	}

	Some(out)
}
