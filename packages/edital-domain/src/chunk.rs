use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
	Title,
	Item,
	Subitem,
	Prose,
}
impl SectionType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::Item => "item",
			Self::Subitem => "subitem",
			Self::Prose => "prose",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"title" => Some(Self::Title),
			"item" => Some(Self::Item),
			"subitem" => Some(Self::Subitem),
			"prose" => Some(Self::Prose),
			_ => None,
		}
	}
}

/// One extracted source file of a document, as handed over by the text
/// extractor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceText {
	pub text: String,
	pub document_index: u32,
	pub page_number: u32,
	pub document_type: String,
}

#[derive(Clone, Debug)]
pub struct DocumentMeta {
	pub document_id: String,
	pub document_index: u32,
	pub page_number: u32,
	pub document_type: String,
}
impl DocumentMeta {
	pub fn for_source(document_id: &str, source: &SourceText) -> Self {
		Self {
			document_id: document_id.to_string(),
			document_index: source.document_index,
			page_number: source.page_number,
			document_type: source.document_type.clone(),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
	pub id: Uuid,
	pub text: String,
	pub embedding: Option<Vec<f32>>,
	pub document_id: String,
	pub document_index: u32,
	pub page_number: u32,
	pub document_type: String,
	pub hierarchy_path: String,
	pub depth: u32,
	pub criticality: f32,
	pub section_type: SectionType,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub original_section_count: u32,
}

/// Deterministic chunk id. Reprocessing a document reproduces the same ids,
/// so storage upserts overwrite instead of duplicating.
pub fn chunk_id_for(document_id: &str, document_index: u32, ordinal: u32) -> Uuid {
	let name = format!("{document_id}:{document_index}:{ordinal}");

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
	Unprocessed,
	Processing,
	Processed,
}
impl ProcessingState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unprocessed => "unprocessed",
			Self::Processing => "processing",
			Self::Processed => "processed",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"unprocessed" => Some(Self::Unprocessed),
			"processing" => Some(Self::Processing),
			"processed" => Some(Self::Processed),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentManifest {
	pub document_id: String,
	pub chunk_ids: Vec<Uuid>,
	pub state: ProcessingState,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl DocumentManifest {
	pub fn new(document_id: &str, state: ProcessingState) -> Self {
		Self {
			document_id: document_id.to_string(),
			chunk_ids: Vec::new(),
			state,
			created_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	pub fn is_processed(&self) -> bool {
		self.state == ProcessingState::Processed
	}
}
