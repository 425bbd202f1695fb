use time::OffsetDateTime;

use edital_config::Chunking;
use edital_domain::{Chunk, DocumentMeta, SectionType, chunk_id_for};

mod consolidate;
mod outline;

use consolidate::ProtoChunk;

/// Chunks one extracted source text. Non-empty input always yields at least
/// one chunk: when no heading is recognized the whole text becomes a single
/// prose chunk with `cfg.fallback_criticality`.
pub fn chunk(raw_text: &str, meta: &DocumentMeta, cfg: &Chunking) -> Vec<Chunk> {
	let trimmed = raw_text.trim();

	if trimmed.is_empty() {
		return Vec::new();
	}

	let parsed = outline::parse_outline(raw_text, cfg);
	let protos = if parsed.has_headings() {
		consolidate::consolidate(
			consolidate::flatten(&parsed, raw_text),
			cfg.min_chunk_chars,
			cfg.max_chunk_chars,
		)
	} else {
		tracing::warn!(
			document_id = %meta.document_id,
			document_index = meta.document_index,
			"No headings recognized, falling back to a single prose chunk."
		);

		vec![ProtoChunk {
			text: trimmed.to_string(),
			hierarchy_path: String::new(),
			depth: 0,
			criticality: cfg.fallback_criticality,
			section_type: SectionType::Prose,
			parent: None,
			section_count: 1,
		}]
	};
	let created_at = OffsetDateTime::now_utc();

	protos
		.into_iter()
		.enumerate()
		.map(|(ordinal, proto)| Chunk {
			id: chunk_id_for(&meta.document_id, meta.document_index, ordinal as u32),
			text: proto.text,
			embedding: None,
			document_id: meta.document_id.clone(),
			document_index: meta.document_index,
			page_number: meta.page_number,
			document_type: meta.document_type.clone(),
			hierarchy_path: proto.hierarchy_path,
			depth: proto.depth,
			criticality: proto.criticality,
			section_type: proto.section_type,
			created_at,
			original_section_count: proto.section_count,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn meta() -> DocumentMeta {
		DocumentMeta {
			document_id: "edital-001".to_string(),
			document_index: 0,
			page_number: 1,
			document_type: "edital".to_string(),
		}
	}

	#[test]
	fn empty_input_yields_no_chunks() {
		assert!(chunk("", &meta(), &Chunking::default()).is_empty());
		assert!(chunk("  \n\t ", &meta(), &Chunking::default()).is_empty());
	}

	#[test]
	fn unstructured_text_falls_back_to_one_prose_chunk() {
		let cfg = Chunking::default();
		let chunks = chunk("texto corrido sem qualquer numeração de seção\n", &meta(), &cfg);

		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].section_type, SectionType::Prose);
		assert_eq!(chunks[0].hierarchy_path, "");
		assert!((chunks[0].criticality - cfg.fallback_criticality).abs() < 1e-6);
	}

	#[test]
	fn ordinals_and_ids_follow_document_order() {
		let cfg = Chunking { min_chunk_chars: 8, ..Chunking::default() };
		let raw = "1. OBJETO\ncontratação de serviços de limpeza predial\n2. PRAZO\nentrega em trinta dias corridos\n";
		let chunks = chunk(raw, &meta(), &cfg);

		assert!(chunks.len() >= 2);

		for (ordinal, piece) in chunks.iter().enumerate() {
			assert_eq!(piece.id, chunk_id_for("edital-001", 0, ordinal as u32));
			assert_eq!(piece.document_id, "edital-001");
		}
	}
}
